//! Octagon Rendering Library
//!
//! This crate provides everything between a window and a finished frame:
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`shader`] - Shader source lookup, compilation, and program linking
//! - [`mesh::VertexData`] / [`mesh::GpuMesh`] - The octagon vertex payload and its GPU upload
//! - [`pipeline::OctagonPipeline`] - Render pipeline with the two matrix uniforms
//! - [`frame::FrameDriver`] - Per-tick rotation and matrix updates
//!
//! The frame driver never touches wgpu directly; it hands a [`frame::Frame`]
//! to a [`frame::FrameTarget`], which keeps the per-tick logic testable
//! without a GPU.

pub mod context;
pub mod frame;
pub mod mesh;
pub mod pipeline;
pub mod shader;

pub use context::{ContextError, RenderContext};
pub use frame::{
    DrawCall, Frame, FrameDriver, FrameSettings, FrameTarget, RotationState, Topology, Viewport,
};
pub use mesh::{GpuMesh, VertexData};
pub use shader::{
    CompiledShader, EmbeddedShaders, LinkError, ProgramLayout, ShaderError, ShaderProgram,
    ShaderSourceProvider, ShaderStage, TaggedSource,
};

// Re-export math types for convenience
pub use octagon_math::{Mat4, Vec3};
