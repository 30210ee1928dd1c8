//! TOML-based configuration for the controller.
//!
//! The default location is platform specific:
//! - Windows:  `%APPDATA%\ch9329-ctl\config.toml`
//! - Linux:    `~/.config/ch9329-ctl/config.toml`
//! - macOS:    `~/Library/Application Support/ch9329-ctl/config.toml`
//!
//! Example file:
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! read_timeout_ms = 500
//! settle_delay_ms = 10
//!
//! [screen]
//! width = 1920
//! height = 1080
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every field has a `#[serde(default = "...")]` helper, so a partial file
//! (or no file at all) still yields a complete [`AppConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// UART link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    /// Device path (`/dev/ttyUSB0`) or port name (`COM3`).
    #[serde(default = "default_port")]
    pub port: String,
    /// The chip ships at 9600 baud; other rates must be set in its parameter block first.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// How long a single read waits for the reply.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Pause between writing a frame and reading the reply.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// Target screen resolution, used to map pixels into the 0..=4095 grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_port() -> String {
    if cfg!(target_os = "windows") {
        "COM3".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_read_timeout_ms() -> u64 {
    500
}
fn default_settle_delay_ms() -> u64 {
    10
}
fn default_screen_width() -> u32 {
    1920
}
fn default_screen_height() -> u32 {
    1080
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ch9329-ctl"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("ch9329-ctl"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ch9329-ctl")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A per-test scratch path under the system temp dir.
    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ch9329-ctl-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_defaults_match_chip_factory_settings() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.serial.baud_rate, 9600);
        assert_eq!(cfg.serial.settle_delay(), Duration::from_millis(10));
        assert_eq!(cfg.serial.read_timeout(), Duration::from_millis(500));
        assert_eq!((cfg.screen.width, cfg.screen.height), (1920, 1080));
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyAMA0"
            baud_rate = 115200
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.serial.port, "/dev/ttyAMA0");
        assert_eq!(cfg.serial.baud_rate, 115200);
        assert_eq!(cfg.serial.settle_delay_ms, 10);
        assert_eq!(cfg.screen, ScreenConfig::default());
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let cfg = load_config(&scratch("does-not-exist.toml")).expect("defaults");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        // Arrange
        let path = scratch("nested/config.toml");
        let mut cfg = AppConfig::default();
        cfg.serial.port = "COM7".to_string();
        cfg.screen.width = 2560;
        cfg.screen.height = 1440;

        // Act
        save_config(&path, &cfg).expect("save");
        let restored = load_config(&path).expect("load");

        // Assert
        assert_eq!(cfg, restored);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let path = scratch("broken.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[serial\nport = ").unwrap();

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }
}
