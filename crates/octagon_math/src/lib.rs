//! Math Library
//!
//! This crate provides the small amount of linear algebra the octagon
//! renderer needs.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Mat4`] - 4x4 column-major matrix, laid out the way shaders expect it
//!
//! Matrix helpers in [`mat4`] follow OpenGL conventions: right-handed view
//! space, clip-space depth in [-1, 1], and transforms that post-multiply the
//! input matrix.

mod vec3;
pub mod mat4;

pub use vec3::Vec3;
pub use mat4::Mat4;
