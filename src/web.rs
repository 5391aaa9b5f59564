//! Browser glue
//!
//! DOM access for the `wasm32` build: the canvas lookup, the blocking alert
//! used for fatal errors, and shader sources read from `<script>` blocks.

use octagon_render::shader::script_source;
use octagon_render::{ShaderError, ShaderSourceProvider, TaggedSource};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement};

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// Canvas element with the given id
pub fn canvas(id: &str) -> Option<HtmlCanvasElement> {
    document()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlCanvasElement>()
        .ok()
}

/// Show a blocking alert dialog
pub fn alert(message: &str) {
    let shown = web_sys::window().map(|w| w.alert_with_message(message));
    if !matches!(shown, Some(Ok(()))) {
        log::error!("Could not show alert: {}", message);
    }
}

/// Shader sources embedded in the page as `<script type="x-shader/...">` blocks
pub struct DocumentShaders {
    document: Document,
}

impl DocumentShaders {
    /// Read from the current page; `None` outside a document
    pub fn current() -> Option<Self> {
        document().map(|document| Self { document })
    }
}

impl ShaderSourceProvider for DocumentShaders {
    fn source(&self, id: &str) -> Result<TaggedSource, ShaderError> {
        let script = self
            .document
            .get_element_by_id(id)
            .ok_or_else(|| ShaderError::NotFound(id.to_string()))?;

        let children = script.child_nodes();
        let nodes = (0..children.length())
            .filter_map(|i| children.item(i))
            .map(|node| (node.node_type(), node.text_content()));
        let script_type = script.get_attribute("type");
        script_source(id, script_type.as_deref(), nodes)
    }
}
