//! End-to-end frame tests
//!
//! Drives the real shader loader and frame driver against a recording target
//! in place of the GPU.

use octagon::config::AppConfig;
use octagon::systems::FrameScheduler;
use octagon_math::mat4::{self, Mat4};
use octagon_render::{
    shader::{load_program, DEFAULT_FRAGMENT_ID, DEFAULT_VERTEX_ID},
    DrawCall, EmbeddedShaders, Frame, FrameDriver, FrameTarget, ShaderProgram, Topology, Vec3,
    VertexData,
};
use web_time::{Duration, Instant};

const EPSILON: f32 = 1e-5;

struct Recorded {
    index: u64,
    projection: Mat4,
    model_view: Mat4,
    program: *const ShaderProgram,
    vertex_count: u32,
    vertex_bytes: usize,
    clear_color: [f32; 4],
    draw: DrawCall,
}

struct RecordingTarget {
    size: (u32, u32),
    frames: Vec<Recorded>,
}

impl RecordingTarget {
    fn new(width: u32, height: u32) -> Self {
        Self { size: (width, height), frames: Vec::new() }
    }
}

impl FrameTarget for RecordingTarget {
    type Error = std::convert::Infallible;

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn submit(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error> {
        self.frames.push(Recorded {
            index: frame.index,
            projection: frame.projection,
            model_view: frame.model_view,
            program: frame.program as *const ShaderProgram,
            vertex_count: frame.vertices.item_count(),
            vertex_bytes: frame.vertices.as_bytes().len(),
            clear_color: frame.clear_color,
            draw: frame.draw,
        });
        Ok(())
    }
}

fn driver() -> FrameDriver {
    let program =
        load_program(&EmbeddedShaders::octagon(), DEFAULT_VERTEX_ID, DEFAULT_FRAGMENT_ID).unwrap();
    FrameDriver::new(program, VertexData::octagon(), AppConfig::default().to_frame_settings())
}

#[test]
fn test_first_frame_at_800x600() {
    let mut driver = driver();
    let mut target = RecordingTarget::new(800, 600);

    driver.tick(&mut target).unwrap();

    assert_eq!(driver.rotation(), 0.01);
    assert_eq!(target.frames.len(), 1);
    let frame = &target.frames[0];
    assert_eq!(frame.index, 0);
    assert!(std::ptr::eq(frame.program, driver.program()));
    assert_eq!(frame.vertex_count, 8);
    assert_eq!(frame.vertex_bytes, 24 * 4);
    assert_eq!(frame.clear_color, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(
        frame.draw,
        DrawCall { topology: Topology::TriangleFan, first_vertex: 0, vertex_count: 8 }
    );

    let expected_projection = mat4::perspective(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0);
    assert!(mat4::max_abs_diff(frame.projection, expected_projection) < EPSILON);

    let expected_model_view = mat4::translate(
        mat4::rotate_z(mat4::IDENTITY, 0.01),
        Vec3::new(-1.5, 0.5, -5.4),
    );
    assert!(mat4::max_abs_diff(frame.model_view, expected_model_view) < EPSILON);
}

#[test]
fn test_projection_follows_resize() {
    let mut driver = driver();
    let mut target = RecordingTarget::new(800, 600);

    driver.tick(&mut target).unwrap();
    target.size = (600, 600);
    driver.tick(&mut target).unwrap();

    let square = mat4::perspective(45f32.to_radians(), 1.0, 0.1, 100.0);
    assert!(mat4::max_abs_diff(target.frames[1].projection, square) < EPSILON);
    assert!(mat4::max_abs_diff(target.frames[0].projection, square) > EPSILON);
}

#[test]
fn test_octagon_lands_in_front_of_camera() {
    let mut driver = driver();
    let mut target = RecordingTarget::new(800, 600);
    driver.tick(&mut target).unwrap();
    let frame = &target.frames[0];

    let mvp = mat4::mul(frame.projection, frame.model_view);
    for i in 0..driver.vertices().item_count() {
        let v = driver.vertices().vertex(i);
        let clip = mat4::transform(mvp, [v[0], v[1], v[2], 1.0]);
        assert!(clip[3] > 0.0, "vertex {} behind the camera", i);
        let ndc_z = clip[2] / clip[3];
        assert!((-1.0..=1.0).contains(&ndc_z), "vertex {} clipped in depth", i);
    }
}

#[test]
fn test_scheduled_ticks() {
    let mut driver = driver();
    let mut target = RecordingTarget::new(800, 600);
    let mut scheduler = FrameScheduler::from_millis(1.0, 16.7);

    let start = Instant::now();
    scheduler.start(start);

    // Simulate a loop that checks every millisecond for 100ms
    let mut now = start;
    let end = start + Duration::from_millis(100);
    while now < end {
        if scheduler.is_due(now) {
            driver.tick(&mut target).unwrap();
            scheduler.complete(now);
        }
        now += Duration::from_millis(1);
    }

    // Ticks at 1ms, then every ~17ms: 1, 18, 35, 52, 69, 86
    assert_eq!(target.frames.len(), 6);
    assert!((driver.rotation() - 0.06).abs() < EPSILON);

    scheduler.stop();
    assert!(!scheduler.is_due(end + Duration::from_secs(1)));
}
