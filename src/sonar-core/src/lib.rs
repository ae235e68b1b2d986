pub mod catalog;
pub mod config;
pub mod logging;
pub mod models;
pub mod paths;

pub use catalog::{CatalogClient, CatalogError, CatalogResult, SEARCH_FAILED_MESSAGE};
pub use config::{
    CatalogConfig, Config, ConfigError, LogLevel, LoggingConfig, PlaybackConfig, SearchConfig,
    UiConfig, ValidationError, DEFAULT_CATALOG_BASE_URL,
};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{NowPlaying, SearchQuery, SearchResultSet, Track, TrackId};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "sonar";
pub const APP_AUTHOR: &str = "Sonar";
pub const APP_QUALIFIER: &str = "io";
