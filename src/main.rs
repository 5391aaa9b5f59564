//! Octagon - native entry point
//!
//! The browser build starts from `octagon::start` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = octagon::run() {
        eprintln!("Event loop failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
