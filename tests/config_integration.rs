//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use octagon::config::AppConfig;
use serial_test::serial;

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("OCT_WINDOW__TITLE", "Test From Env");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.window.title, "Test From Env");
    std::env::remove_var("OCT_WINDOW__TITLE");
}

#[test]
#[serial]
fn test_env_override_numeric() {
    std::env::set_var("OCT_ANIMATION__ROTATION_STEP", "0.05");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.animation.rotation_step, 0.05);
    assert_eq!(config.to_frame_settings().rotation_step, 0.05);
    std::env::remove_var("OCT_ANIMATION__ROTATION_STEP");
}

#[test]
#[serial]
fn test_default_file_matches_builtin_defaults() {
    std::env::remove_var("OCT_WINDOW__TITLE");
    std::env::remove_var("OCT_ANIMATION__ROTATION_STEP");

    let cwd = std::env::current_dir().unwrap();
    assert!(cwd.join("config/default.toml").exists());

    // user.toml is local and may legitimately change anything
    if cwd.join("config/user.toml").exists() {
        return;
    }

    let loaded = AppConfig::load().unwrap();
    let builtin = AppConfig::default();
    assert_eq!(loaded.to_frame_settings(), builtin.to_frame_settings());
    assert_eq!(loaded.window.canvas_id, builtin.window.canvas_id);
    assert_eq!(loaded.shaders.vertex_id, builtin.shaders.vertex_id);
    assert_eq!(loaded.shaders.fragment_id, builtin.shaders.fragment_id);
    assert_eq!(loaded.animation.frame_delay_ms, builtin.animation.frame_delay_ms);
}

#[test]
#[serial]
fn test_missing_directory_uses_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.window.width, 800);
    assert_eq!(config.window.height, 600);
}
