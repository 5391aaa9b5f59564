//! Render pipeline components
//!
//! This module contains the wgpu pipeline that draws the octagon and the
//! GPU-compatible types it uploads.

pub mod types;
pub mod octagon_pipeline;

pub use types::{MatrixUniform, DEPTH_FORMAT};
pub use octagon_pipeline::{OctagonPipeline, vertex_format};
