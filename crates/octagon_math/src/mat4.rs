//! 4x4 Matrix utilities
//!
//! Column-major matrices indexed as `m[column][row]`, which is also the
//! memory layout uniform buffers expect. The builder-style helpers
//! (`rotate_z`, `translate`) post-multiply their input: `translate(m, v)`
//! returns `m * T(v)`, so the last transform applied in code is the first
//! one applied to a vertex.

use crate::Vec3;

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Create a rotation matrix in the plane spanned by two axes.
///
/// # Arguments
/// * `angle` - Rotation angle in radians
/// * `p1`, `p2` - Indices of the axes forming the rotation plane (0=X, 1=Y, 2=Z)
///
/// Positive angles rotate axis `p1` towards axis `p2`.
///
/// # Example
/// ```
/// use octagon_math::mat4::plane_rotation;
/// // Rotation about the Z axis (XY plane)
/// let roll = plane_rotation(0.5, 0, 1);
/// ```
pub fn plane_rotation(angle: f32, p1: usize, p2: usize) -> Mat4 {
    let cs = angle.cos();
    let sn = angle.sin();

    let mut m = IDENTITY;

    m[p1][p1] = cs;
    m[p2][p2] = cs;
    m[p1][p2] = sn;
    m[p2][p1] = -sn;

    m
}

/// Translation matrix moving points by `v`
pub fn translation(v: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = v.x;
    m[3][1] = v.y;
    m[3][2] = v.z;
    m
}

/// Rotate `m` about the Z axis: returns `m * Rz(angle)`
pub fn rotate_z(m: Mat4, angle: f32) -> Mat4 {
    mul(m, plane_rotation(angle, 0, 1))
}

/// Translate `m` by `v`: returns `m * T(v)`
///
/// Only the last column changes, so this is computed directly instead of
/// through a full multiply.
pub fn translate(m: Mat4, v: Vec3) -> Mat4 {
    let mut result = m;
    for row in 0..4 {
        result[3][row] = m[0][row] * v.x + m[1][row] * v.y + m[2][row] * v.z + m[3][row];
    }
    result
}

/// Right-handed perspective projection with OpenGL clip depth ([-1, 1]).
///
/// # Arguments
/// * `fov_y` - Vertical field of view in radians
/// * `aspect` - Viewport width divided by height
/// * `near`, `far` - Distances to the clipping planes
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, (far + near) * nf, -1.0],
        [0.0, 0.0, 2.0 * far * near * nf, 0.0],
    ]
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a homogeneous vector by a 4x4 matrix (column-major)
///
/// result = M * v
pub fn transform(m: Mat4, v: [f32; 4]) -> [f32; 4] {
    [
        m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2] + m[3][0] * v[3],
        m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2] + m[3][1] * v[3],
        m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2] + m[3][2] * v[3],
        m[0][3] * v[0] + m[1][3] * v[1] + m[2][3] * v[2] + m[3][3] * v[3],
    ]
}

/// Transform a point (w = 1) and drop the w component
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    let r = transform(m, [p.x, p.y, p.z, 1.0]);
    Vec3::new(r[0], r[1], r[2])
}

/// Largest absolute difference between corresponding elements
pub fn max_abs_diff(a: Mat4, b: Mat4) -> f32 {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn mat_approx_eq(a: Mat4, b: Mat4) -> bool {
        max_abs_diff(a, b) < EPSILON
    }

    #[test]
    fn test_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec_approx_eq(transform_point(IDENTITY, p), p));
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        use std::f32::consts::FRAC_PI_2;

        let m = rotate_z(IDENTITY, FRAC_PI_2);

        let result = transform_point(m, Vec3::X);
        assert!(vec_approx_eq(result, Vec3::Y), "X should become Y, got {:?}", result);

        let result = transform_point(m, Vec3::Y);
        assert!(
            vec_approx_eq(result, Vec3::new(-1.0, 0.0, 0.0)),
            "Y should become -X, got {:?}",
            result
        );

        let result = transform_point(m, Vec3::Z);
        assert!(vec_approx_eq(result, Vec3::Z), "Z should be unchanged, got {:?}", result);
    }

    #[test]
    fn test_rotate_z_column_layout() {
        let m = rotate_z(IDENTITY, 0.3);
        assert!(approx_eq(m[0][0], 0.3f32.cos()));
        assert!(approx_eq(m[0][1], 0.3f32.sin()));
        assert!(approx_eq(m[1][0], -0.3f32.sin()));
        assert!(approx_eq(m[1][1], 0.3f32.cos()));
    }

    #[test]
    fn test_translate_from_identity() {
        let m = translate(IDENTITY, Vec3::new(-1.5, 0.5, -5.4));
        assert_eq!(m[3], [-1.5, 0.5, -5.4, 1.0]);
        assert!(mat_approx_eq(m, translation(Vec3::new(-1.5, 0.5, -5.4))));
    }

    #[test]
    fn test_translate_matches_mul() {
        let r = rotate_z(IDENTITY, 0.7);
        let v = Vec3::new(2.0, -1.0, 4.0);
        assert!(mat_approx_eq(translate(r, v), mul(r, translation(v))));
    }

    #[test]
    fn test_rotate_then_translate_moves_offset() {
        use std::f32::consts::FRAC_PI_2;

        // Rz * T: the translation itself gets rotated
        let m = translate(rotate_z(IDENTITY, FRAC_PI_2), Vec3::X);
        let origin = transform_point(m, Vec3::ZERO);
        assert!(vec_approx_eq(origin, Vec3::Y), "got {:?}", origin);
    }

    #[test]
    fn test_perspective_values() {
        let proj = perspective(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0);
        let f = 1.0 / (22.5f32.to_radians()).tan();

        assert!(approx_eq(proj[0][0], f * 0.75));
        assert!(approx_eq(proj[1][1], f));
        assert!(approx_eq(proj[2][2], -100.1 / 99.9));
        assert_eq!(proj[2][3], -1.0);
        assert!(approx_eq(proj[3][2], -20.0 / 99.9));
        assert_eq!(proj[3][3], 0.0);
    }

    #[test]
    fn test_perspective_maps_clip_planes() {
        let proj = perspective(45f32.to_radians(), 1.0, 0.1, 100.0);

        let near = transform(proj, [0.0, 0.0, -0.1, 1.0]);
        assert!(approx_eq(near[2] / near[3], -1.0));

        let far = transform(proj, [0.0, 0.0, -100.0, 1.0]);
        assert!(approx_eq(far[2] / far[3], 1.0));
    }

    #[test]
    fn test_mul_identity() {
        let a = plane_rotation(0.5, 0, 1);
        assert!(mat_approx_eq(mul(IDENTITY, a), a));
        assert!(mat_approx_eq(mul(a, IDENTITY), a));
    }

    #[test]
    fn test_mul_composition() {
        use std::f32::consts::FRAC_PI_4;

        // Two 45° rotations should equal one 90° rotation
        let r45 = plane_rotation(FRAC_PI_4, 0, 1);
        let r90 = plane_rotation(FRAC_PI_4 * 2.0, 0, 1);

        assert!(mat_approx_eq(mul(r45, r45), r90));
    }

    #[test]
    fn test_max_abs_diff() {
        let mut m = IDENTITY;
        m[2][1] = 0.25;
        assert_eq!(max_abs_diff(IDENTITY, IDENTITY), 0.0);
        assert_eq!(max_abs_diff(IDENTITY, m), 0.25);
    }
}
