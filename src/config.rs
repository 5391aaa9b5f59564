//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`OCT_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use octagon_render::FrameSettings;
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Animation configuration
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Shader source ids
    #[serde(default)]
    pub shaders: ShaderConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`OCT_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // OCT_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("OCT_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Frame inputs derived from the camera, animation and rendering sections
    pub fn to_frame_settings(&self) -> FrameSettings {
        FrameSettings {
            fov_y_degrees: self.camera.fov,
            near: self.camera.near,
            far: self.camera.far,
            translation: self.animation.translation.into(),
            clear_color: self.rendering.background_color,
            rotation_step: self.animation.rotation_step,
            rotation_limit: self.animation.rotation_limit,
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Id of the canvas element used in the browser
    pub canvas_id: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Octagon".to_string(),
            width: 800,
            height: 600,
            canvas_id: "lesson01-canvas".to_string(),
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let frame = FrameSettings::default();
        Self {
            fov: frame.fov_y_degrees,
            near: frame.near,
            far: frame.far,
        }
    }
}

/// Animation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Rotation added each tick (radians)
    pub rotation_step: f32,
    /// Rotation resets to zero once it exceeds this value
    pub rotation_limit: f32,
    /// Model offset applied after the rotation [x, y, z]
    pub translation: [f32; 3],
    /// Delay between the end of one tick and the next, in milliseconds
    pub frame_delay_ms: f32,
    /// Delay before the first tick, in milliseconds
    pub initial_delay_ms: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        let frame = FrameSettings::default();
        Self {
            rotation_step: frame.rotation_step,
            rotation_limit: frame.rotation_limit,
            translation: frame.translation.to_array(),
            frame_delay_ms: 16.7,
            initial_delay_ms: 1.0,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    /// Background color [r, g, b, a]
    pub background_color: [f32; 4],
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            background_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Shader source ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    pub vertex_id: String,
    pub fragment_id: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex_id: octagon_render::shader::DEFAULT_VERTEX_ID.to_string(),
            fragment_id: octagon_render::shader::DEFAULT_FRAGMENT_ID.to_string(),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.canvas_id, "lesson01-canvas");
        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.animation.rotation_step, 0.01);
        assert_eq!(config.animation.rotation_limit, 90.0);
        assert_eq!(config.shaders.vertex_id, "shader-vs");
    }

    #[test]
    fn test_default_frame_settings_match_renderer_defaults() {
        assert_eq!(AppConfig::default().to_frame_settings(), FrameSettings::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("canvas_id"));
        assert!(toml.contains("rotation_limit"));
    }

    #[test]
    fn test_partial_section_is_rejected() {
        // Sections default as a whole; a partial section must name every key
        let result: Result<AppConfig, _> = toml::from_str("[camera]\nfov = 60.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig =
            toml::from_str("[camera]\nfov = 60.0\nnear = 0.5\nfar = 50.0\n").unwrap();
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.to_frame_settings().near, 0.5);
    }
}
