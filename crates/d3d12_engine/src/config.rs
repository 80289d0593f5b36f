//! Engine configuration.
//!
//! Values come from an optional TOML file and are then overridden by the
//! command line:
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "D3D12 Engine <Direct3D 12>"
//!
//! [graphics]
//! use_warp_device = false
//! vsync = true
//! clear_color = [0.0, 0.2, 0.4, 1.0]
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;
use std::path::PathBuf;

use eyre::eyre;
use eyre::WrapErr;
use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineResult;
use crate::logging::LogLevel;

pub const DEFAULT_CONFIG_FILE: &str = "d3d12_engine.toml";

/// Largest back buffer side Direct3D 12 guarantees
/// (`D3D12_REQ_TEXTURE2D_U_OR_V_DIMENSION`).
pub const MAX_WINDOW_DIMENSION: u32 = 16384;

/// Converts a pixel extent to the signed form `RECT` and `CreateWindowExW` use.
pub fn signed_dimension(value: u32) -> EngineResult<i32> {
    i32::try_from(value)
        .map_err(|_| eyre!("Dimension {value} does not fit in a signed 32-bit extent").into())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Client area width in pixels.
    pub width: u32,
    /// Client area height in pixels.
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Render on the WARP software rasterizer instead of a hardware adapter.
    pub use_warp_device: bool,
    /// Ask DXGI for the high performance GPU first when enumerating adapters.
    pub high_performance_adapter: bool,
    pub vsync: bool,
    pub clear_color: [f32; 4],
    pub debug_layer: bool,
    /// Only takes effect when `debug_layer` is set.
    pub gpu_based_validation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "D3D12 Engine <Direct3D 12>".to_string(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            use_warp_device: false,
            high_performance_adapter: false,
            vsync: true,
            clear_color: [0.0, 0.2, 0.4, 1.0],
            debug_layer: cfg!(debug_assertions),
            gpu_based_validation: true,
        }
    }
}

impl GraphicsConfig {
    /// Sync interval handed to `IDXGISwapChain::Present`.
    pub fn sync_interval(&self) -> u32 {
        if self.vsync { 1 } else { 0 }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))
            .map_err(Into::into)
    }

    /// Loads `path` if it exists, otherwise falls back to the defaults.
    ///
    /// Runs before logging is configured, so it reports nothing itself.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> EngineResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(eyre!(
                "Window dimensions must be greater than 0, got {}x{}",
                self.window.width,
                self.window.height
            )
            .into());
        }
        if self.window.width > MAX_WINDOW_DIMENSION || self.window.height > MAX_WINDOW_DIMENSION {
            return Err(eyre!(
                "Window dimensions must be at most {MAX_WINDOW_DIMENSION}, got {}x{}",
                self.window.width,
                self.window.height
            )
            .into());
        }
        if let Some(component) = self
            .graphics
            .clear_color
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(eyre!("Clear color component {component} is outside [0, 1]").into());
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.window.width as f32 / self.window.height as f32
    }

    pub fn window_title(&self) -> String {
        let mut title = self.window.title.clone();
        if self.graphics.use_warp_device {
            title.push_str(" (WARP)");
        }
        title
    }
}

/// Arguments recognised on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandLine {
    pub use_warp_device: bool,
    pub config_path: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub no_vsync: bool,
    pub high_performance: bool,
    /// Arguments that were not recognised, kept for logging once it is up.
    pub ignored: Vec<String>,
}

impl CommandLine {
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut command_line = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            if arg.eq_ignore_ascii_case("-warp") || arg.eq_ignore_ascii_case("/warp") {
                command_line.use_warp_device = true;
            } else if arg == "--no-vsync" {
                command_line.no_vsync = true;
            } else if arg == "--high-performance" {
                command_line.high_performance = true;
            } else if arg == "--config" {
                command_line.config_path = args.next().map(|p| PathBuf::from(p.as_ref()));
            } else if arg == "--width" {
                command_line.width = args.next().and_then(|v| v.as_ref().parse().ok());
            } else if arg == "--height" {
                command_line.height = args.next().and_then(|v| v.as_ref().parse().ok());
            } else {
                command_line.ignored.push(arg.to_string());
            }
        }
        command_line
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn apply(&self, config: &mut EngineConfig) {
        if self.use_warp_device {
            config.graphics.use_warp_device = true;
        }
        if self.no_vsync {
            config.graphics.vsync = false;
        }
        if self.high_performance {
            config.graphics.high_performance_adapter = true;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hello_triangle() {
        let config = EngineConfig::default();
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert_eq!(config.window.title, "D3D12 Engine <Direct3D 12>");
        assert_eq!(config.graphics.clear_color, [0.0, 0.2, 0.4, 1.0]);
        assert_eq!(config.graphics.sync_interval(), 1);
        assert!(!config.graphics.use_warp_device);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [window]
            width = 800

            [graphics]
            vsync = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.graphics.sync_interval(), 0);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn toml_round_trips_through_a_file() {
        let mut config = EngineConfig::default();
        config.window.title = "Triangle".into();
        config.graphics.use_warp_device = true;

        let path = std::env::temp_dir().join(format!(
            "d3d12_engine_config_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load("/nonexistent/d3d12_engine.toml").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(EngineConfig::from_toml_str("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.window.height = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.graphics.clear_color = [0.0, 1.5, 0.0, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn command_line_overrides_config() {
        let command_line = CommandLine::parse([
            "/WARP",
            "--width",
            "640",
            "--height",
            "480",
            "--no-vsync",
            "--config",
            "custom.toml",
            "--high-performance",
            "--unknown",
        ]);
        assert!(command_line.use_warp_device);
        assert_eq!(command_line.config_path(), PathBuf::from("custom.toml"));
        assert_eq!(command_line.ignored, vec!["--unknown".to_string()]);

        let mut config = EngineConfig::default();
        command_line.apply(&mut config);
        assert!(config.graphics.use_warp_device);
        assert!(config.graphics.high_performance_adapter);
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert!(!config.graphics.vsync);
        assert_eq!(config.window_title(), "D3D12 Engine <Direct3D 12> (WARP)");
        assert!((config.aspect_ratio() - 4.0 / 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let mut config = EngineConfig::default();
        CommandLine::parse(["--width", "3000000000"]).apply(&mut config);
        assert_eq!(config.window.width, 3_000_000_000);
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("at most 16384"));

        let mut config = EngineConfig::default();
        config.window.height = MAX_WINDOW_DIMENSION + 1;
        assert!(config.validate().is_err());

        config.window.height = MAX_WINDOW_DIMENSION;
        config.window.width = MAX_WINDOW_DIMENSION;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn signed_dimensions_never_wrap() {
        assert_eq!(signed_dimension(1280).unwrap(), 1280);
        assert_eq!(signed_dimension(i32::MAX as u32).unwrap(), i32::MAX);
        assert!(signed_dimension(3_000_000_000).is_err());
    }

    #[test]
    fn title_without_warp_is_unchanged() {
        let mut config = EngineConfig::default();
        CommandLine::parse(["--high-performance"]).apply(&mut config);
        assert!(config.graphics.high_performance_adapter);
        assert!(!config.graphics.use_warp_device);
        assert_eq!(config.window_title(), "D3D12 Engine <Direct3D 12>");
    }

    #[test]
    fn bad_numbers_are_ignored() {
        let command_line = CommandLine::parse(["--width", "abc", "-warp"]);
        assert_eq!(command_line.width, None);
        assert!(command_line.use_warp_device);
        assert_eq!(command_line.config_path(), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn bundled_config_is_the_default() {
        let bundled = EngineConfig::from_toml_str(include_str!("../d3d12_engine.toml")).unwrap();
        assert_eq!(bundled, EngineConfig::default());
    }
}
