//! Configuration file support for the shelf labeler.
//!
//! Settings are stored as JSON under the user's config directory and can be
//! overridden from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::color_utils::{FALLBACK_GRAY, PALETTE, Rgb, from_hex};
use crate::constants::{
    DEFAULT_CLUSTER_COUNT, DEFAULT_DISPLAY_WIDTH, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS,
    MASTER_LABELS,
};
use crate::model::LabelOptions;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Parse a level name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Backend connection
    #[serde(default)]
    pub server: ServerConfig,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Label list and colors
    #[serde(default)]
    pub labels: LabelConfig,
}

fn default_app_name() -> String {
    "Shelf Labeler".to_string()
}

/// Backend connection section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL the endpoints are resolved against
    #[serde(default = "default_server_url")]
    pub base_url: String,

    /// Timeout for every backend call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// User preferences section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Cluster count requested for a new image
    #[serde(default = "default_cluster_count")]
    pub default_cluster_count: u32,

    /// Maximum width the shelf image is rendered at
    #[serde(default = "default_display_width")]
    pub display_width: u32,

    /// Default folder for overlay and crop exports
    #[serde(default)]
    pub export_folder: String,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_cluster_count() -> u32 {
    DEFAULT_CLUSTER_COUNT
}

fn default_display_width() -> u32 {
    DEFAULT_DISPLAY_WIDTH
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_cluster_count: default_cluster_count(),
            display_width: default_display_width(),
            export_folder: String::new(),
            log_level: LogLevel::default(),
        }
    }
}

impl UserPreferences {
    /// Resolve an export path against the export folder, if it is relative.
    pub fn export_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.export_folder.is_empty() {
            path.to_path_buf()
        } else {
            Path::new(&self.export_folder).join(path)
        }
    }
}

/// Label section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Labels every session starts with
    #[serde(default = "default_master_labels")]
    pub master: Vec<String>,

    /// Box palette, assigned to labels in first-seen order
    #[serde(default = "default_palette", deserialize_with = "deserialize_palette")]
    pub palette: Vec<Rgb>,

    /// Color for unlabeled boxes on the results overlay
    #[serde(default = "default_fallback_color", deserialize_with = "deserialize_color")]
    pub fallback_color: Rgb,
}

fn default_master_labels() -> Vec<String> {
    MASTER_LABELS.iter().map(|s| s.to_string()).collect()
}

fn default_palette() -> Vec<Rgb> {
    PALETTE.to_vec()
}

fn default_fallback_color() -> Rgb {
    FALLBACK_GRAY
}

/// A color written either as `"#rrggbb"` or as `[r, g, b]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorValue {
    Hex(String),
    Rgb(Rgb),
}

impl ColorValue {
    fn into_rgb<E: serde::de::Error>(self) -> Result<Rgb, E> {
        match self {
            ColorValue::Rgb(color) => Ok(color),
            ColorValue::Hex(hex) => {
                from_hex(&hex).ok_or_else(|| E::custom(format!("invalid color `{hex}`")))
            }
        }
    }
}

fn deserialize_palette<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Rgb>, D::Error> {
    Vec::<ColorValue>::deserialize(deserializer)?
        .into_iter()
        .map(ColorValue::into_rgb)
        .collect()
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
    ColorValue::deserialize(deserializer)?.into_rgb()
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            master: default_master_labels(),
            palette: default_palette(),
            fallback_color: default_fallback_color(),
        }
    }
}

impl LabelConfig {
    /// Label options seeded from the master list.
    pub fn options(&self) -> LabelOptions {
        LabelOptions::new(&self.master)
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            server: ServerConfig::default(),
            preferences: UserPreferences::default(),
            labels: LabelConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "shelf-labeler-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("shelf-labeler").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("shelf-labeler")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Write the default configuration to `path` unless a file is already there.
    ///
    /// Returns whether a file was written.
    pub fn create_if_missing(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        Self::new().save(path)?;
        Ok(true)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
        assert_eq!(config.preferences.default_cluster_count, 10);
        assert_eq!(config.labels.options().len(), 3);
        assert_eq!(config.labels.palette.len(), 10);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::new();
        config.server.base_url = "http://shelf.local:9000".to_string();
        config.labels.master.push("Pepsi Can".to_string());
        config.preferences.log_level = LogLevel::Debug;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.server.base_url, "http://shelf.local:9000");
        assert_eq!(loaded.labels.options().len(), 4);
        assert_eq!(loaded.preferences.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1, "server": {"timeout_secs": 5}}"#).unwrap();
        assert_eq!(config.server.timeout(), Duration::from_secs(5));
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
        assert_eq!(config.preferences.display_width, DEFAULT_DISPLAY_WIDTH);
        assert_eq!(config.labels.fallback_color, FALLBACK_GRAY);
    }

    #[test]
    fn test_version_too_new_rejected() {
        let result = AppConfig::from_json(r#"{"version": 99}"#);
        assert!(matches!(result, Err(ConfigError::VersionTooNew { file_version: 99, .. })));
    }

    #[test]
    fn test_palette_accepts_hex_and_arrays() {
        let json = r##"{"version": 1, "labels": {
            "palette": ["#1f77b4", [255, 127, 14]],
            "fallback_color": "a0a0a0"
        }}"##;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.labels.palette, vec![[31, 119, 180], [255, 127, 14]]);
        assert_eq!(config.labels.fallback_color, [160, 160, 160]);

        let bad = r##"{"version": 1, "labels": {"palette": ["#nothex"]}}"##;
        assert!(matches!(AppConfig::from_json(bad), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_create_if_missing_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf-labeler").join(AppConfig::default_filename());

        assert!(AppConfig::create_if_missing(&path).unwrap());
        let written = AppConfig::load(&path).unwrap();
        assert_eq!(written.server.base_url, DEFAULT_SERVER_URL);

        std::fs::write(&path, r#"{"version": 1, "app_name": "edited"}"#).unwrap();
        assert!(!AppConfig::create_if_missing(&path).unwrap());
        assert_eq!(AppConfig::load(&path).unwrap().app_name, "edited");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_export_path_resolution() {
        let mut prefs = UserPreferences::default();
        assert_eq!(prefs.export_path(Path::new("a.png")), PathBuf::from("a.png"));
        prefs.export_folder = "/tmp/exports".to_string();
        assert_eq!(prefs.export_path(Path::new("a.png")), PathBuf::from("/tmp/exports/a.png"));
        assert_eq!(prefs.export_path(Path::new("/abs/a.png")), PathBuf::from("/abs/a.png"));
    }
}
