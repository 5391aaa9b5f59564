//! Shader loading and program linking
//!
//! Shader sources come from a [`ShaderSourceProvider`], keyed by id and tagged
//! with the stage they belong to. Each stage is compiled (parsed and
//! validated) on its own; linking then resolves the names the renderer
//! relies on:
//!
//! - the `aVertexPosition` vertex input and its location
//! - the `uPMatrix` and `uMVMatrix` uniforms and their bindings
//!
//! and checks that every fragment input is fed by a vertex output, and that
//! neither stage binds any resource besides the two matrices.
//!
//! Nothing here needs a GPU. The pipeline only ever sees a [`ShaderProgram`]
//! that has already linked, so a failed compile can never reach the frame loop.

use std::collections::HashMap;
use std::fmt;

use crate::mesh::VertexData;

/// Name of the per-vertex position input
pub const POSITION_ATTRIBUTE: &str = "aVertexPosition";
/// Name of the projection matrix uniform
pub const PROJECTION_UNIFORM: &str = "uPMatrix";
/// Name of the model-view matrix uniform
pub const MODEL_VIEW_UNIFORM: &str = "uMVMatrix";

/// Script type tag for vertex shaders
pub const VERTEX_SCRIPT_TYPE: &str = "x-shader/x-vertex";
/// Script type tag for fragment shaders
pub const FRAGMENT_SCRIPT_TYPE: &str = "x-shader/x-fragment";

/// Default id of the vertex shader source
pub const DEFAULT_VERTEX_ID: &str = "shader-vs";
/// Default id of the fragment shader source
pub const DEFAULT_FRAGMENT_ID: &str = "shader-fs";

/// DOM `nodeType` of a text node
pub const TEXT_NODE: u16 = 3;

/// Pipeline stage a shader source is written for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Parse a script type tag (`x-shader/x-vertex`, `x-shader/x-fragment`)
    pub fn from_script_type(script_type: &str) -> Option<Self> {
        match script_type.trim() {
            VERTEX_SCRIPT_TYPE => Some(ShaderStage::Vertex),
            FRAGMENT_SCRIPT_TYPE => Some(ShaderStage::Fragment),
            _ => None,
        }
    }

    /// The script type tag for this stage
    pub fn script_type(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_SCRIPT_TYPE,
            ShaderStage::Fragment => FRAGMENT_SCRIPT_TYPE,
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Shader source text together with its stage tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedSource {
    pub stage: ShaderStage,
    pub code: String,
}

impl TaggedSource {
    pub fn new(stage: ShaderStage, code: impl Into<String>) -> Self {
        Self { stage, code: code.into() }
    }

    /// Build a source from a script type tag, rejecting unknown tags
    pub fn from_script(
        id: &str,
        script_type: &str,
        code: impl Into<String>,
    ) -> Result<Self, ShaderError> {
        let stage =
            ShaderStage::from_script_type(script_type).ok_or_else(|| ShaderError::UnknownType {
                id: id.to_string(),
                script_type: script_type.to_string(),
            })?;
        Ok(Self::new(stage, code))
    }
}

/// Source of a `<script>` element, given its child nodes and `type` attribute
///
/// Children are `(nodeType, textContent)` pairs. Only direct text children
/// make up the code; elements, comments and their contents are skipped. A
/// missing `type` attribute is an unknown type.
pub fn script_source<I, S>(
    id: &str,
    script_type: Option<&str>,
    children: I,
) -> Result<TaggedSource, ShaderError>
where
    I: IntoIterator<Item = (u16, Option<S>)>,
    S: AsRef<str>,
{
    let mut code = String::new();
    for (node_type, text) in children {
        if node_type != TEXT_NODE {
            continue;
        }
        if let Some(text) = text {
            code.push_str(text.as_ref());
        }
    }
    TaggedSource::from_script(id, script_type.unwrap_or_default(), code)
}

/// Anything that can look up shader sources by id
pub trait ShaderSourceProvider {
    fn source(&self, id: &str) -> Result<TaggedSource, ShaderError>;
}

/// Shader sources compiled into the binary
#[derive(Clone, Debug, Default)]
pub struct EmbeddedShaders {
    sources: HashMap<String, TaggedSource>,
}

impl EmbeddedShaders {
    /// Create an empty set of sources
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in octagon shaders under the default ids
    pub fn octagon() -> Self {
        Self::new()
            .with(
                DEFAULT_VERTEX_ID,
                TaggedSource::new(ShaderStage::Vertex, include_str!("shaders/octagon.vert.wgsl")),
            )
            .with(
                DEFAULT_FRAGMENT_ID,
                TaggedSource::new(ShaderStage::Fragment, include_str!("shaders/octagon.frag.wgsl")),
            )
    }

    /// Add or replace a source (builder style)
    pub fn with(mut self, id: impl Into<String>, source: TaggedSource) -> Self {
        self.insert(id, source);
        self
    }

    /// Add or replace a source
    pub fn insert(&mut self, id: impl Into<String>, source: TaggedSource) {
        self.sources.insert(id.into(), source);
    }
}

impl ShaderSourceProvider for EmbeddedShaders {
    fn source(&self, id: &str) -> Result<TaggedSource, ShaderError> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| ShaderError::NotFound(id.to_string()))
    }
}

/// A single stage that parsed and validated successfully
#[derive(Clone, Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    entry_point: String,
    entry_index: usize,
    code: String,
    module: naga::Module,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Name of the entry point for this stage
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// WGSL source text
    pub fn code(&self) -> &str {
        &self.code
    }

    fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Compile one stage: parse, validate, and find its entry point
pub fn compile_shader(stage: ShaderStage, code: &str) -> Result<CompiledShader, ShaderError> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(code),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator.validate(&module).map_err(|e| ShaderError::Compile {
        stage,
        log: error_chain(e.as_inner()),
    })?;

    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage.naga_stage())
        .ok_or_else(|| ShaderError::Compile {
            stage,
            log: format!("no {} entry point", stage),
        })?;
    let entry_point = module.entry_points[entry_index].name.clone();

    log::debug!("Compiled {} shader (entry point '{}')", stage, entry_point);

    Ok(CompiledShader {
        stage,
        entry_point,
        entry_index,
        code: code.to_string(),
        module,
    })
}

/// Where the renderer's named shader inputs ended up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramLayout {
    /// Vertex input location of `aVertexPosition`
    pub position_location: u32,
    /// Number of float components in `aVertexPosition`
    pub position_components: u32,
    /// Binding index of `uPMatrix` (group 0)
    pub projection_binding: u32,
    /// Binding index of `uMVMatrix` (group 0)
    pub model_view_binding: u32,
}

/// Linked vertex + fragment pair with resolved input locations
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    vertex: CompiledShader,
    fragment: CompiledShader,
    layout: ProgramLayout,
}

impl ShaderProgram {
    pub fn vertex(&self) -> &CompiledShader {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledShader {
        &self.fragment
    }

    pub fn layout(&self) -> ProgramLayout {
        self.layout
    }

    /// Check that `vertices` can feed `aVertexPosition`
    ///
    /// Each vertex must hold at least as many floats as the attribute reads.
    pub fn check_vertex_data(&self, vertices: &VertexData) -> Result<(), LinkError> {
        if self.layout.position_components > vertices.item_size() {
            return Err(LinkError::AttributeWidth {
                name: POSITION_ATTRIBUTE,
                components: self.layout.position_components,
                item_size: vertices.item_size(),
            });
        }
        Ok(())
    }
}

/// Link two compiled stages into a program
pub fn link_program(
    vertex: CompiledShader,
    fragment: CompiledShader,
) -> Result<ShaderProgram, ShaderError> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(LinkError::StageMismatch {
            expected: ShaderStage::Vertex,
            found: vertex.stage,
        }
        .into());
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(LinkError::StageMismatch {
            expected: ShaderStage::Fragment,
            found: fragment.stage,
        }
        .into());
    }

    let module = &vertex.module;
    let entry = vertex.entry();

    let (position_location, position_ty) = entry
        .function
        .arguments
        .iter()
        .find_map(|arg| {
            let name = arg.name.as_deref();
            named_location(module, name, arg.ty, arg.binding.as_ref(), POSITION_ATTRIBUTE)
        })
        .ok_or(LinkError::MissingAttribute(POSITION_ATTRIBUTE))?;

    let position_components = match module.types[position_ty].inner {
        naga::TypeInner::Vector { size, scalar } if scalar == naga::Scalar::F32 => size as u32,
        ref other => {
            return Err(LinkError::AttributeType {
                name: POSITION_ATTRIBUTE,
                found: format!("{:?}", other),
            }
            .into())
        }
    };

    let projection_binding = uniform_binding(module, PROJECTION_UNIFORM)?;
    let model_view_binding = uniform_binding(module, MODEL_VIEW_UNIFORM)?;
    if projection_binding == model_view_binding {
        return Err(LinkError::BindingConflict {
            binding: projection_binding,
        }
        .into());
    }

    check_resources(module, ShaderStage::Vertex, projection_binding, model_view_binding)?;
    check_resources(
        &fragment.module,
        ShaderStage::Fragment,
        projection_binding,
        model_view_binding,
    )?;

    let outputs = output_locations(module, entry);
    let fragment_entry = fragment.entry();
    for location in input_locations(&fragment.module, fragment_entry) {
        if !outputs.contains(&location) {
            return Err(LinkError::UnmatchedInput { location }.into());
        }
    }

    let layout = ProgramLayout {
        position_location,
        position_components,
        projection_binding,
        model_view_binding,
    };
    log::info!(
        "Linked shader program ({} + {}): {:?}",
        vertex.entry_point,
        fragment.entry_point,
        layout
    );

    Ok(ShaderProgram { vertex, fragment, layout })
}

/// Fetch, compile and link a program from two source ids
pub fn load_program(
    provider: &dyn ShaderSourceProvider,
    vertex_id: &str,
    fragment_id: &str,
) -> Result<ShaderProgram, ShaderError> {
    let vertex_source = provider.source(vertex_id)?;
    let fragment_source = provider.source(fragment_id)?;

    let vertex = compile_shader(vertex_source.stage, &vertex_source.code)?;
    let fragment = compile_shader(fragment_source.stage, &fragment_source.code)?;

    link_program(vertex, fragment)
}

/// Match a named location-bound input, looking through struct members
fn named_location(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    wanted: &str,
) -> Option<(u32, naga::Handle<naga::Type>)> {
    match binding {
        Some(naga::Binding::Location { location, .. }) if name == Some(wanted) => {
            Some((*location, ty))
        }
        Some(_) => None,
        None => match module.types[ty].inner {
            naga::TypeInner::Struct { ref members, .. } => members.iter().find_map(|member| {
                let name = member.name.as_deref();
                named_location(module, name, member.ty, member.binding.as_ref(), wanted)
            }),
            _ => None,
        },
    }
}

/// Collect `@location` indices from a binding, or from a struct's members
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(*location),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { ref members, .. } = module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn output_locations(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<u32> {
    let mut out = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn input_locations(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<u32> {
    let mut out = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

/// Resolve a `mat4x4<f32>` uniform in group 0 by name
fn uniform_binding(module: &naga::Module, name: &'static str) -> Result<u32, LinkError> {
    let var = module
        .global_variables
        .iter()
        .map(|(_, var)| var)
        .find(|var| var.name.as_deref() == Some(name) && var.space == naga::AddressSpace::Uniform)
        .ok_or(LinkError::MissingUniform(name))?;

    check_matrix(module, var, name)?;

    match var.binding {
        Some(naga::ResourceBinding { group: 0, binding }) => Ok(binding),
        Some(naga::ResourceBinding { group, .. }) => {
            Err(LinkError::UnsupportedGroup { name, group })
        }
        None => Err(LinkError::MissingUniform(name)),
    }
}

/// `var` must be a `mat4x4<f32>` in uniform space
fn check_matrix(
    module: &naga::Module,
    var: &naga::GlobalVariable,
    name: &'static str,
) -> Result<(), LinkError> {
    if var.space != naga::AddressSpace::Uniform {
        return Err(LinkError::UniformType {
            name,
            found: format!("{:?}", var.space),
        });
    }
    match module.types[var.ty].inner {
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => Ok(()),
        ref other => Err(LinkError::UniformType {
            name,
            found: format!("{:?}", other),
        }),
    }
}

/// Every bound global in `module` must be one of the two matrices at its linked binding
fn check_resources(
    module: &naga::Module,
    stage: ShaderStage,
    projection_binding: u32,
    model_view_binding: u32,
) -> Result<(), LinkError> {
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else {
            continue;
        };
        let linked = match var.name.as_deref() {
            Some(PROJECTION_UNIFORM) => Some((PROJECTION_UNIFORM, projection_binding)),
            Some(MODEL_VIEW_UNIFORM) => Some((MODEL_VIEW_UNIFORM, model_view_binding)),
            _ => None,
        };
        match linked {
            Some((name, expected)) if binding.group == 0 && binding.binding == expected => {
                check_matrix(module, var, name)?;
            }
            _ => {
                return Err(LinkError::UnexpectedResource {
                    stage,
                    name: var.name.clone().unwrap_or_default(),
                    group: binding.group,
                    binding: binding.binding,
                })
            }
        }
    }
    Ok(())
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Shader loading error
#[derive(Debug)]
pub enum ShaderError {
    /// No source registered under this id
    NotFound(String),
    /// Source exists but its type tag is not a known shader stage
    UnknownType { id: String, script_type: String },
    /// Compiler rejected the source
    Compile { stage: ShaderStage, log: String },
    /// Stages compiled but could not be linked
    Link(LinkError),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::NotFound(id) => write!(f, "Shader source not found: {}", id),
            ShaderError::UnknownType { id, script_type } => {
                write!(f, "Shader '{}' has unknown type '{}'", id, script_type)
            }
            ShaderError::Compile { stage, log } => {
                write!(f, "Failed to compile {} shader: {}", stage, log)
            }
            ShaderError::Link(err) => write!(f, "Could not initialise shaders: {}", err),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Link(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LinkError> for ShaderError {
    fn from(err: LinkError) -> Self {
        ShaderError::Link(err)
    }
}

/// Reasons two compiled stages fail to form a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    StageMismatch { expected: ShaderStage, found: ShaderStage },
    MissingAttribute(&'static str),
    AttributeType { name: &'static str, found: String },
    /// The attribute reads more floats than each vertex holds
    AttributeWidth { name: &'static str, components: u32, item_size: u32 },
    MissingUniform(&'static str),
    UniformType { name: &'static str, found: String },
    UnsupportedGroup { name: &'static str, group: u32 },
    BindingConflict { binding: u32 },
    UnmatchedInput { location: u32 },
    /// A bound resource the pipeline layout does not provide
    UnexpectedResource { stage: ShaderStage, name: String, group: u32, binding: u32 },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::StageMismatch { expected, found } => {
                write!(f, "expected a {} shader, got a {} shader", expected, found)
            }
            LinkError::MissingAttribute(name) => write!(f, "vertex input '{}' not found", name),
            LinkError::AttributeType { name, found } => {
                write!(f, "vertex input '{}' must be a float vector, found {}", name, found)
            }
            LinkError::AttributeWidth { name, components, item_size } => write!(
                f,
                "vertex input '{}' reads {} floats but each vertex holds {}",
                name, components, item_size
            ),
            LinkError::MissingUniform(name) => write!(f, "uniform '{}' not found", name),
            LinkError::UniformType { name, found } => {
                write!(f, "uniform '{}' must be mat4x4<f32>, found {}", name, found)
            }
            LinkError::UnsupportedGroup { name, group } => {
                write!(
                    f,
                    "uniform '{}' is in bind group {}, only group 0 is supported",
                    name, group
                )
            }
            LinkError::BindingConflict { binding } => {
                write!(f, "both matrix uniforms use binding {}", binding)
            }
            LinkError::UnmatchedInput { location } => write!(
                f,
                "fragment input at location {} is not written by the vertex shader",
                location
            ),
            LinkError::UnexpectedResource { stage, name, group, binding } => write!(
                f,
                "{} shader binds '{}' at group {} binding {}, which the program does not provide",
                stage, name, group, binding
            ),
        }
    }
}

impl std::error::Error for LinkError {}
