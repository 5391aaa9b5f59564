//! Render pipeline for the octagon
//!
//! Built from a linked [`ShaderProgram`]: the vertex attribute location and
//! both uniform bindings come from the program layout rather than being
//! hard-coded, so the pipeline always agrees with the shaders it runs.
//! Both matrices are visible to both stages; the linker has already rejected
//! any other resource.

use wgpu::util::DeviceExt;

use super::types::{MatrixUniform, DEPTH_FORMAT};
use crate::frame::{Frame, Viewport};
use crate::mesh::{draw_index_count, GpuMesh, VertexData};
use crate::shader::{LinkError, ShaderError, ShaderProgram, POSITION_ATTRIBUTE};

/// Stages that read the matrix uniforms
pub const MATRIX_VISIBILITY: wgpu::ShaderStages =
    wgpu::ShaderStages::VERTEX.union(wgpu::ShaderStages::FRAGMENT);

/// Vertex format for a float vector with `components` components
pub fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// Render pipeline drawing one static mesh with two matrix uniforms
#[allow(dead_code)] // bind_group_layout kept alive alongside the bind group
pub struct OctagonPipeline {
    /// The render pipeline
    pipeline: wgpu::RenderPipeline,
    /// Bind group layout for both matrices
    bind_group_layout: wgpu::BindGroupLayout,
    /// `uPMatrix` buffer
    projection_buffer: wgpu::Buffer,
    /// `uMVMatrix` buffer
    model_view_buffer: wgpu::Buffer,
    /// Bind group for both matrices
    bind_group: wgpu::BindGroup,
    /// Depth texture
    depth_texture: Option<wgpu::TextureView>,
    depth_size: (u32, u32),
}

impl OctagonPipeline {
    /// Create the pipeline for `program`, reading vertices shaped like `vertices`
    ///
    /// Fails when the vertex data cannot feed the program's position input.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        program: &ShaderProgram,
        vertices: &VertexData,
    ) -> Result<Self, ShaderError> {
        let layout = program.layout();
        program.check_vertex_data(vertices)?;
        let format = vertex_format(layout.position_components).ok_or_else(|| {
            LinkError::AttributeType {
                name: POSITION_ATTRIBUTE,
                found: format!("{} components", layout.position_components),
            }
        })?;

        let matrix_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: MATRIX_VISIBILITY,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<MatrixUniform>() as u64,
                ),
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Octagon Bind Group Layout"),
            entries: &[
                matrix_entry(layout.projection_binding),
                matrix_entry(layout.model_view_binding),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Octagon Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Octagon Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(program.vertex().code().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Octagon Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(program.fragment().code().into()),
        });

        let attributes = [wgpu::VertexAttribute {
            format,
            offset: 0,
            shader_location: layout.position_location,
        }];
        let vertex_buffer_layout = wgpu::VertexBufferLayout {
            array_stride: vertices.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Octagon Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(program.vertex().entry_point()),
                buffers: &[vertex_buffer_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(program.fragment().entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                // Fans are replayed through the mesh index buffer
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let matrix_buffer = |label: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&MatrixUniform::default()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let projection_buffer = matrix_buffer("uPMatrix Buffer");
        let model_view_buffer = matrix_buffer("uMVMatrix Buffer");

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Octagon Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: layout.projection_binding,
                    resource: projection_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: layout.model_view_binding,
                    resource: model_view_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!(
            "Created octagon pipeline ({:?}, attribute @location({}))",
            surface_format,
            layout.position_location
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            projection_buffer,
            model_view_buffer,
            bind_group,
            depth_texture: None,
            depth_size: (0, 0),
        })
    }

    /// Upload both matrices
    pub fn update_uniforms(
        &self,
        queue: &wgpu::Queue,
        projection: &MatrixUniform,
        model_view: &MatrixUniform,
    ) {
        queue.write_buffer(&self.projection_buffer, 0, bytemuck::bytes_of(projection));
        queue.write_buffer(&self.model_view_buffer, 0, bytemuck::bytes_of(model_view));
    }

    /// Ensure depth texture exists and is the right size
    pub fn ensure_depth_texture(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if self.depth_texture.is_none() || self.depth_size != (width, height) {
            let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });

            let view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.depth_texture = Some(view);
            self.depth_size = (width, height);
        }
    }

    /// Record the render pass for `frame`
    ///
    /// Uniforms must already be uploaded with [`Self::update_uniforms`].
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        mesh: &GpuMesh,
        frame: &Frame<'_>,
    ) {
        let Some(index_count) = draw_index_count(frame.draw, mesh.vertex_count())
            .filter(|&count| count <= mesh.index_count())
        else {
            log::warn!(
                "Frame {} draws {} vertices from {}, mesh holds {}",
                frame.index,
                frame.draw.vertex_count,
                frame.draw.first_vertex,
                mesh.vertex_count()
            );
            return;
        };
        let Some(depth_view) = self.depth_texture.as_ref() else {
            log::warn!("Depth texture missing, skipping frame {}", frame.index);
            return;
        };

        let [r, g, b, a] = frame.clear_color;
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Octagon Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let viewport = clamp_viewport(frame.viewport, self.depth_size);
        if let Some(Viewport { x, y, width, height }) = viewport {
            render_pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
        render_pass.set_index_buffer(mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..index_count, frame.draw.first_vertex as i32, 0..1);
    }
}

/// Clip a viewport to the attachment size; `None` if nothing remains
fn clamp_viewport(viewport: Viewport, (max_w, max_h): (u32, u32)) -> Option<Viewport> {
    let x = viewport.x.min(max_w);
    let y = viewport.y.min(max_h);
    let width = viewport.width.min(max_w - x);
    let height = viewport.height.min(max_h - y);
    (width > 0 && height > 0).then_some(Viewport { x, y, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_format_for_octagon() {
        assert_eq!(vertex_format(3), Some(wgpu::VertexFormat::Float32x3));
        assert_eq!(
            vertex_format(3).map(|f| f.size()),
            Some(VertexData::octagon().stride())
        );
        assert_eq!(vertex_format(5), None);
    }

    #[test]
    fn test_matrices_visible_to_both_stages() {
        assert!(MATRIX_VISIBILITY.contains(wgpu::ShaderStages::VERTEX));
        assert!(MATRIX_VISIBILITY.contains(wgpu::ShaderStages::FRAGMENT));
    }

    #[test]
    fn test_clamp_viewport() {
        assert_eq!(
            clamp_viewport(Viewport::full(800, 600), (800, 600)),
            Some(Viewport::full(800, 600))
        );
        assert_eq!(
            clamp_viewport(Viewport::full(1024, 768), (800, 600)),
            Some(Viewport::full(800, 600))
        );
        assert_eq!(clamp_viewport(Viewport::full(0, 600), (800, 600)), None);
    }
}
