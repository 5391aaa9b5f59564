//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context and surface
//! - The octagon pipeline and its uploaded mesh
//! - Drawing the frames produced by the frame driver

use octagon_render::{
    context::RenderContext,
    pipeline::{MatrixUniform, OctagonPipeline},
    Frame, FrameTarget, GpuMesh, ShaderError, ShaderProgram, Topology, VertexData,
};

/// Render error types
#[derive(Debug)]
pub enum RenderError {
    /// Surface was lost or outdated (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// Other surface error
    Other(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            e => RenderError::Other(format!("{:?}", e)),
        }
    }
}

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    pipeline: OctagonPipeline,
    mesh: GpuMesh,
}

impl RenderSystem {
    /// Build the pipeline for `program` and upload `vertices` once
    pub fn new(
        context: RenderContext,
        program: &ShaderProgram,
        vertices: &VertexData,
        topology: Topology,
    ) -> Result<Self, ShaderError> {
        let mut pipeline =
            OctagonPipeline::new(&context.device, context.config.format, program, vertices)?;

        // Ensure depth texture exists
        pipeline.ensure_depth_texture(&context.device, context.size.width, context.size.height);

        let mesh = GpuMesh::upload(&context.device, vertices, topology);

        Ok(Self {
            context,
            pipeline,
            mesh,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context
            .resize(winit::dpi::PhysicalSize::new(width, height));
        let (width, height) = self.context.size();
        self.pipeline.ensure_depth_texture(&self.context.device, width, height);
    }

    /// Reconfigure the surface after it was lost
    pub fn recover_surface(&mut self) {
        log::warn!("Surface lost, reconfiguring");
        self.context.reconfigure();
    }

    /// Get current surface size
    pub fn size(&self) -> (u32, u32) {
        self.context.size()
    }
}

impl FrameTarget for RenderSystem {
    type Error = RenderError;

    fn surface_size(&self) -> (u32, u32) {
        self.size()
    }

    fn submit(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.pipeline.update_uniforms(
            &self.context.queue,
            &MatrixUniform::new(frame.projection),
            &MatrixUniform::new(frame.model_view),
        );

        // Get surface texture
        let output = self.context.surface.get_current_texture()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.pipeline.render(&mut encoder, &view, &self.mesh, frame);

        // Submit
        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        assert_eq!(format!("{}", RenderError::SurfaceLost), "Surface lost");
        assert_eq!(format!("{}", RenderError::OutOfMemory), "Out of memory");
        assert_eq!(
            format!("{}", RenderError::Other("test".to_string())),
            "Render error: test"
        );
    }

    #[test]
    fn test_surface_error_mapping() {
        let map = RenderError::from;
        assert!(matches!(map(wgpu::SurfaceError::Lost), RenderError::SurfaceLost));
        assert!(matches!(map(wgpu::SurfaceError::Outdated), RenderError::SurfaceLost));
        assert!(matches!(map(wgpu::SurfaceError::OutOfMemory), RenderError::OutOfMemory));
        assert!(matches!(map(wgpu::SurfaceError::Timeout), RenderError::Other(_)));
    }
}
