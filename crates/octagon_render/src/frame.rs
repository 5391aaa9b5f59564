//! Per-tick frame computation
//!
//! [`FrameDriver`] owns everything that changes or is read once per tick:
//! the rotation angle, the linked program and the vertex data. Each tick it
//! advances the rotation, rebuilds both matrices from scratch, and hands the
//! result to a [`FrameTarget`] as one [`Frame`].

use octagon_math::mat4::{self, Mat4, IDENTITY};
use octagon_math::Vec3;

use crate::mesh::VertexData;
use crate::shader::ShaderProgram;

/// The rotation angle and its update rule
///
/// Each advance adds `step`; a value above `limit` resets to exactly zero.
/// There is no lower bound and the overflow is discarded, not carried.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationState {
    angle: f32,
    step: f32,
    limit: f32,
}

impl RotationState {
    pub const DEFAULT_STEP: f32 = 0.01;
    pub const DEFAULT_LIMIT: f32 = 90.0;

    /// Start at angle zero
    pub fn new(step: f32, limit: f32) -> Self {
        Self { angle: 0.0, step, limit }
    }

    /// Start from a specific angle
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Current angle in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Advance by one step and return the new angle
    pub fn advance(&mut self) -> f32 {
        self.angle += self.step;
        if self.angle > self.limit {
            self.angle = 0.0;
        }
        self.angle
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP, Self::DEFAULT_LIMIT)
    }
}

/// Pixel rectangle a frame is drawn into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport covering a whole surface
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Width over height; 1.0 for an empty surface
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// How vertices are assembled into triangles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Every triangle shares the first vertex
    TriangleFan,
}

/// The logical draw issued each frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub topology: Topology,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// Fixed inputs to every frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSettings {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Applied after the Z rotation
    pub translation: Vec3,
    /// RGBA
    pub clear_color: [f32; 4],
    pub rotation_step: f32,
    pub rotation_limit: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            translation: Vec3::new(-1.5, 0.5, -5.4),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            rotation_step: RotationState::DEFAULT_STEP,
            rotation_limit: RotationState::DEFAULT_LIMIT,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// Zero-based tick counter
    pub index: u64,
    pub viewport: Viewport,
    /// Color and depth are both cleared; depth clears to 1.0
    pub clear_color: [f32; 4],
    pub projection: Mat4,
    pub model_view: Mat4,
    pub program: &'a ShaderProgram,
    pub vertices: &'a VertexData,
    pub draw: DrawCall,
}

/// Something a frame can be drawn to
pub trait FrameTarget {
    type Error;

    /// Current surface size in pixels
    fn surface_size(&self) -> (u32, u32);

    /// Draw one frame
    fn submit(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error>;
}

/// Advances the rotation and produces one frame per tick
pub struct FrameDriver {
    settings: FrameSettings,
    rotation: RotationState,
    program: ShaderProgram,
    vertices: VertexData,
    frames: u64,
}

impl FrameDriver {
    pub fn new(program: ShaderProgram, vertices: VertexData, settings: FrameSettings) -> Self {
        Self {
            rotation: RotationState::new(settings.rotation_step, settings.rotation_limit),
            settings,
            program,
            vertices,
            frames: 0,
        }
    }

    /// Current rotation angle
    pub fn rotation(&self) -> f32 {
        self.rotation.angle()
    }

    /// Number of ticks run so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn vertices(&self) -> &VertexData {
        &self.vertices
    }

    /// Perspective projection for a viewport
    pub fn projection_matrix(&self, viewport: Viewport) -> Mat4 {
        mat4::perspective(
            self.settings.fov_y_degrees.to_radians(),
            viewport.aspect_ratio(),
            self.settings.near,
            self.settings.far,
        )
    }

    /// Identity, rotated about Z by `angle`, then translated
    pub fn model_view_matrix(&self, angle: f32) -> Mat4 {
        let m = mat4::rotate_z(IDENTITY, angle);
        mat4::translate(m, self.settings.translation)
    }

    /// Triangle fan over every vertex
    pub fn draw_call(&self) -> DrawCall {
        DrawCall {
            topology: Topology::TriangleFan,
            first_vertex: 0,
            vertex_count: self.vertices.item_count(),
        }
    }

    /// Run one tick against `target`
    ///
    /// The rotation advances even when the target fails to draw.
    pub fn tick<T: FrameTarget>(&mut self, target: &mut T) -> Result<(), T::Error> {
        let angle = self.rotation.advance();
        let (width, height) = target.surface_size();
        let viewport = Viewport::full(width, height);

        let frame = Frame {
            index: self.frames,
            viewport,
            clear_color: self.settings.clear_color,
            projection: self.projection_matrix(viewport),
            model_view: self.model_view_matrix(angle),
            program: &self.program,
            vertices: &self.vertices,
            draw: self.draw_call(),
        };
        self.frames += 1;

        log::trace!("Frame {}: angle {:.4}, viewport {}x{}", frame.index, angle, width, height);

        target.submit(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{load_program, EmbeddedShaders, DEFAULT_FRAGMENT_ID, DEFAULT_VERTEX_ID};

    const EPSILON: f32 = 1e-5;

    struct NullTarget {
        size: (u32, u32),
        draws: Vec<(Viewport, DrawCall)>,
    }

    impl FrameTarget for NullTarget {
        type Error = ();

        fn surface_size(&self) -> (u32, u32) {
            self.size
        }

        fn submit(&mut self, frame: &Frame<'_>) -> Result<(), ()> {
            self.draws.push((frame.viewport, frame.draw));
            Ok(())
        }
    }

    fn driver() -> FrameDriver {
        let shaders = EmbeddedShaders::octagon();
        let program = load_program(&shaders, DEFAULT_VERTEX_ID, DEFAULT_FRAGMENT_ID).unwrap();
        FrameDriver::new(program, VertexData::octagon(), FrameSettings::default())
    }

    #[test]
    fn test_rotation_steps() {
        let mut r = RotationState::default();
        assert_eq!(r.advance(), 0.01);
        assert_eq!(r.advance(), 0.01f32 + 0.01f32);
    }

    #[test]
    fn test_rotation_wraps_to_exact_zero() {
        let mut r = RotationState::default().with_angle(89.995);
        assert_eq!(r.advance(), 0.0);
        assert_eq!(r.advance(), 0.01);
    }

    #[test]
    fn test_rotation_at_limit_does_not_wrap() {
        // Only values strictly above the limit reset
        let mut r = RotationState::new(1.0, 90.0).with_angle(89.0);
        assert_eq!(r.advance(), 90.0);
        assert_eq!(r.advance(), 0.0);
    }

    #[test]
    fn test_rotation_has_no_lower_bound() {
        let mut r = RotationState::new(-0.5, 90.0);
        assert_eq!(r.advance(), -0.5);
        assert_eq!(r.advance(), -1.0);
    }

    #[test]
    fn test_viewport_aspect() {
        assert_eq!(Viewport::full(800, 600).aspect_ratio(), 800.0 / 600.0);
        assert_eq!(Viewport::full(800, 0).aspect_ratio(), 1.0);
    }

    #[test]
    fn test_model_view_at_zero_is_translation() {
        let d = driver();
        let mv = d.model_view_matrix(0.0);
        let expected = mat4::translation(Vec3::new(-1.5, 0.5, -5.4));
        assert!(mat4::max_abs_diff(mv, expected) < EPSILON);
    }

    #[test]
    fn test_tick_draws_full_viewport_fan() {
        let mut d = driver();
        let mut target = NullTarget { size: (640, 480), draws: Vec::new() };

        d.tick(&mut target).unwrap();
        d.tick(&mut target).unwrap();

        assert_eq!(d.frame_count(), 2);
        assert_eq!(target.draws.len(), 2);
        let (viewport, draw) = target.draws[0];
        assert_eq!(viewport, Viewport::full(640, 480));
        assert_eq!(
            draw,
            DrawCall { topology: Topology::TriangleFan, first_vertex: 0, vertex_count: 8 }
        );
    }

    #[test]
    fn test_tick_advances_even_when_submit_fails() {
        struct Failing;
        impl FrameTarget for Failing {
            type Error = &'static str;
            fn surface_size(&self) -> (u32, u32) {
                (1, 1)
            }
            fn submit(&mut self, _frame: &Frame<'_>) -> Result<(), &'static str> {
                Err("lost")
            }
        }

        let mut d = driver();
        assert_eq!(d.tick(&mut Failing), Err("lost"));
        assert_eq!(d.rotation(), 0.01);
    }
}
