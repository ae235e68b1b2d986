use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.deezer.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            catalog: CatalogConfig::default(),
            search: SearchConfig::default(),
            playback: PlaybackConfig::default(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
    /// Overall request timeout. Expiry is reported as a search failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            result_limit: default_result_limit(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Length of a simulated preview clip.
    #[serde(default = "default_preview_seconds")]
    pub preview_seconds: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            preview_seconds: default_preview_seconds(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log lines to stderr. Forced off while the terminal UI runs.
    #[serde(default = "default_console_enabled", alias = "stdout")]
    pub console: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            console: default_console_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("catalog.base_url must be an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("catalog.result_limit must be between 1 and 100, got {0}")]
    ResultLimitOutOfRange(u32),
    #[error("catalog.timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        Self::load_from(&Self::config_path(dirs))
    }

    /// Loads the file at `path`, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        let base = self.catalog.base_url.as_str();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl(base.to_string()));
        }
        if !(1..=100).contains(&self.catalog.result_limit) {
            return Err(ValidationError::ResultLimitOutOfRange(
                self.catalog.result_limit,
            ));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_base_url() -> String {
    DEFAULT_CATALOG_BASE_URL.to_string()
}

fn default_result_limit() -> u32 {
    25
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_preview_seconds() -> u64 {
    30
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_console_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.base_url, "https://api.deezer.com");
        assert_eq!(config.catalog.result_limit, 25);
        assert_eq!(config.search.debounce(), Duration::from_millis(500));
        assert_eq!(config.logging.max_log_files, 7);
        assert!(config.logging.console);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn invalid_version_rejected() {
        let mut config = Config::default();
        config.config_version = CURRENT_CONFIG_VERSION + 1;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let mut config = Config::default();
        config.catalog.base_url = "ftp://example.com".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = Config::default();
        config.catalog.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ValidationError::ZeroTimeout)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.toml")).expect("defaults");
        assert_eq!(config.search.debounce_ms, 500);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).expect("create");
        writeln!(
            file,
            "[search]\ndebounce_ms = 250\n\n[catalog]\ntimeout_secs = 3\n\n[logging]\nlevel = \"debug\""
        )
        .expect("write");

        let config = Config::load_from(&path).expect("parse");
        assert_eq!(config.search.debounce_ms, 250);
        assert_eq!(config.catalog.timeout(), Duration::from_secs(3));
        assert_eq!(config.catalog.result_limit, 25);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "search = [").expect("write");

        let err = Config::load_from(&path).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
