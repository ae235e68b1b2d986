use sonar_core::catalog::CatalogResult;
use sonar_core::models::{SearchQuery, SearchResultSet, Track};

/// What the search area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    /// No query typed yet, or the query was cleared.
    #[default]
    Empty,
    Loading {
        query: String,
    },
    Results,
    NoResults,
    /// The last search failed. The previous result set stays visible.
    Error {
        message: String,
    },
}

/// How a catalog reply was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// A newer query has been issued since; the reply was discarded.
    Stale,
    Results(usize),
    NoResults,
    Failed,
}

impl ResponseOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ResponseOutcome::Stale)
    }
}

/// Owns the lifecycle of "the current search".
///
/// Several requests may be in flight; only the reply to the most recently
/// issued query is ever applied. Sequence numbers stand in for request
/// cancellation.
#[derive(Debug, Default)]
pub struct SearchCoordinator {
    latest_sequence: u64,
    active: Option<SearchResultSet>,
    status: SearchStatus,
}

impl SearchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    pub fn active(&self) -> Option<&SearchResultSet> {
        self.active.as_ref()
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn is_current(&self, query_id: u64) -> bool {
        query_id == self.latest_sequence
    }

    /// Starts a new search. Returns the query the caller must send to the
    /// catalog, or `None` when the text is blank.
    ///
    /// A blank query still advances the sequence so replies to earlier
    /// queries that are still in flight get discarded.
    pub fn submit_query(&mut self, text: &str) -> Option<SearchQuery> {
        self.latest_sequence += 1;
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(sequence = self.latest_sequence, "blank query, showing empty state");
            self.active = None;
            self.status = SearchStatus::Empty;
            return None;
        }

        tracing::debug!(sequence = self.latest_sequence, query = text, "issuing search");
        self.status = SearchStatus::Loading {
            query: text.to_string(),
        };
        Some(SearchQuery {
            text: text.to_string(),
            sequence: self.latest_sequence,
        })
    }

    pub fn apply_response(
        &mut self,
        query_id: u64,
        result: CatalogResult<Vec<Track>>,
    ) -> ResponseOutcome {
        if !self.is_current(query_id) {
            tracing::debug!(
                query_id,
                latest = self.latest_sequence,
                "discarding stale search reply"
            );
            return ResponseOutcome::Stale;
        }

        match result {
            Ok(tracks) if tracks.is_empty() => {
                self.active = None;
                self.status = SearchStatus::NoResults;
                ResponseOutcome::NoResults
            }
            Ok(tracks) => {
                let count = tracks.len();
                tracing::info!(query_id, count, "search results applied");
                self.active = Some(SearchResultSet::new(query_id, tracks));
                self.status = SearchStatus::Results;
                ResponseOutcome::Results(count)
            }
            Err(err) => {
                tracing::warn!(query_id, error = %err, "search failed");
                self.status = SearchStatus::Error {
                    message: err.user_message().to_string(),
                };
                ResponseOutcome::Failed
            }
        }
    }

    /// Hides the error banner, returning to whatever the results show.
    pub fn dismiss_error(&mut self) -> bool {
        if !matches!(self.status, SearchStatus::Error { .. }) {
            return false;
        }
        self.status = match &self.active {
            Some(_) => SearchStatus::Results,
            None => SearchStatus::Empty,
        };
        true
    }
}

impl SearchStatus {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SearchStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SearchStatus::Loading { .. })
    }
}
