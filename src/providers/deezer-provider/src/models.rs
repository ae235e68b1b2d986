use serde::Deserialize;

/// Body of `GET /search`. Deezer reports API-level failures in-band with
/// HTTP 200 and an `error` object instead of `data`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<TrackItem>>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TrackItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub artist: Option<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub cover_medium: Option<String>,
}
