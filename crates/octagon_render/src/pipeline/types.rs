//! GPU-compatible data types for the octagon pipeline
//!
//! These types are designed to match the shader layouts exactly.
//! All types derive Pod and Zeroable for safe GPU buffer operations.

use bytemuck::{Pod, Zeroable};
use octagon_math::mat4::{Mat4, IDENTITY};

/// Depth buffer format used by the pipeline
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A single `mat4x4<f32>` uniform (64 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MatrixUniform {
    /// Column-major matrix
    pub matrix: Mat4,
}

impl MatrixUniform {
    pub fn new(matrix: Mat4) -> Self {
        Self { matrix }
    }
}

impl Default for MatrixUniform {
    fn default() -> Self {
        Self { matrix: IDENTITY }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_matrix_uniform_size() {
        // 16 floats = 64 bytes, the size of mat4x4<f32>
        assert_eq!(size_of::<MatrixUniform>(), 64);
        assert_eq!(std::mem::align_of::<MatrixUniform>(), 4);
    }

    #[test]
    fn test_matrix_uniform_bytes_are_column_major() {
        let mut m = IDENTITY;
        m[3][0] = -1.5;
        let u = MatrixUniform::new(m);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&u));
        // Column 3, row 0 is the 13th float
        assert_eq!(floats[12], -1.5);
        assert_eq!(floats[0], 1.0);
    }
}
