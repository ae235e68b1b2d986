use crate::models::Track;
use thiserror::Error;

/// User-facing text for any failed search. Causes are logged, not shown.
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed, please try again.";

/// Categories of catalog failures.
///
/// The UI never distinguishes between these; they all surface as
/// [`SEARCH_FAILED_MESSAGE`]. The split exists for logging.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("catalog returned HTTP {status}")]
    Status { status: u16 },
    #[error("malformed catalog response: {message}")]
    Decode { message: String },
    #[error("catalog error: {message}")]
    Api { message: String },
    #[error("{message}")]
    Other { message: String },
}

impl CatalogError {
    pub fn user_message(&self) -> &'static str {
        SEARCH_FAILED_MESSAGE
    }

    /// Every catalog failure may be retried by searching again.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Remote track catalog.
///
/// Implementations return tracks in the catalog's relevance order.
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Stable catalog identifier (e.g., "deezer").
    fn id(&self) -> &str;

    async fn search(&self, query: &str) -> CatalogResult<Vec<Track>>;
}
