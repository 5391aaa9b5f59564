//! Octagon - a rotating octagon drawn with wgpu
//!
//! Runs natively in a window or in the browser on a canvas. The rendering
//! pieces live in `octagon_render`; this crate loads configuration, sets up
//! logging and drives the event loop.

pub mod app;
pub mod config;
pub mod logging;
pub mod systems;

#[cfg(target_arch = "wasm32")]
pub mod web;

use winit::{error::EventLoopError, event_loop::EventLoop};

use app::App;
use config::AppConfig;

/// Load configuration, falling back to defaults on error
#[cfg(not(target_arch = "wasm32"))]
fn load_config() -> (AppConfig, Option<config::ConfigError>) {
    match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    }
}

/// The browser has no config directory or environment
#[cfg(target_arch = "wasm32")]
fn load_config() -> (AppConfig, Option<config::ConfigError>) {
    (AppConfig::default(), None)
}

/// Run the application until the window closes
pub fn run() -> Result<(), EventLoopError> {
    let (config, config_error) = load_config();
    logging::init_logging(&config.debug.log_level);
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting Octagon");

    let event_loop = EventLoop::new()?;
    run_app(event_loop, App::new(config))
}

#[cfg(not(target_arch = "wasm32"))]
fn run_app(event_loop: EventLoop<()>, mut app: App) -> Result<(), EventLoopError> {
    event_loop.run_app(&mut app)
}

#[cfg(target_arch = "wasm32")]
fn run_app(event_loop: EventLoop<()>, app: App) -> Result<(), EventLoopError> {
    use winit::platform::web::EventLoopExtWebSys;
    event_loop.spawn_app(app);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    if let Err(e) = run() {
        log::error!("Event loop failed: {}", e);
        web::alert(&e.to_string());
    }
}
