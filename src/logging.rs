//! Logger setup
//!
//! Natively `env_logger` reads `RUST_LOG` and falls back to the configured
//! level. In the browser, output goes to the console and panics are routed
//! there too.

use std::sync::Once;

static INIT: Once = Once::new();

/// Parse a configured level name, defaulting to `Info`
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.trim().parse().unwrap_or(log::LevelFilter::Info)
}

/// Install the logger; later calls are no-ops
pub fn init_logging(level: &str) {
    let level = parse_level(level);
    INIT.call_once(|| install(level));
}

#[cfg(not(target_arch = "wasm32"))]
fn install(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
    if let Err(e) = result {
        eprintln!("Logger already installed: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn install(level: log::LevelFilter) {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let level = level.to_level().unwrap_or(log::Level::Error);
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::error_1(&format!("Logger already installed: {}", e).into());
    }
}
