use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog-scoped track identifier.
///
/// The catalog hands out numeric ids; they are unique within one catalog and
/// stable across searches, which is what card/session matching relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl TrackId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for TrackId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A track as returned by a catalog search. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist_name: String,
    pub album_title: String,
    pub cover_url: Option<String>,
    pub duration_seconds: u32,
    /// Short preview clip; `None` when the catalog serves no preview.
    pub preview_url: Option<String>,
}

impl Track {
    pub fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }
}

/// The subset of track metadata the playback session keeps around for the
/// player bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub id: TrackId,
    pub title: String,
    pub artist_name: String,
    pub cover_url: Option<String>,
    pub preview_url: Option<String>,
}

impl From<&Track> for NowPlaying {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            artist_name: track.artist_name.clone(),
            cover_url: track.cover_url.clone(),
            preview_url: track.preview_url.clone(),
        }
    }
}

/// A search issued to the catalog, tagged with the sequence number used to
/// discard stale replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub sequence: u64,
}

/// The ordered tracks returned for one query. Order is the catalog's
/// relevance order and is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub query_id: u64,
    pub tracks: Vec<Track>,
}

impl SearchResultSet {
    pub fn new(query_id: u64, tracks: Vec<Track>) -> Self {
        Self { query_id, tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn find(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }
}
