//! Application systems
//!
//! The pieces the app wires together: window, GPU rendering and frame scheduling.

mod render;
mod scheduler;
mod window;

pub use render::{RenderError, RenderSystem};
pub use scheduler::FrameScheduler;
pub use window::{WindowError, WindowSystem};
