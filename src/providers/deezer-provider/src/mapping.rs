use crate::models::TrackItem;
use sonar_core::models::{Track, TrackId};

pub fn map_track(item: &TrackItem) -> Track {
    let album = item.album.as_ref();
    Track {
        id: TrackId::new(item.id),
        title: item.title.clone(),
        artist_name: item
            .artist
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| "Unknown Artist".into()),
        album_title: album
            .and_then(|a| a.title.clone())
            .unwrap_or_else(|| "Unknown Album".into()),
        cover_url: album.and_then(|a| {
            non_empty(a.cover_medium.as_deref()).or_else(|| non_empty(a.cover.as_deref()))
        }),
        duration_seconds: item.duration.unwrap_or(0),
        preview_url: non_empty(item.preview.as_deref()),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlbumRef, ArtistRef};

    fn item(album: Option<AlbumRef>, preview: Option<&str>) -> TrackItem {
        TrackItem {
            id: 3135556,
            title: "Harder, Better, Faster, Stronger".into(),
            duration: Some(224),
            preview: preview.map(str::to_string),
            artist: Some(ArtistRef {
                name: "Daft Punk".into(),
            }),
            album,
        }
    }

    #[test]
    fn prefers_medium_cover() {
        let track = map_track(&item(
            Some(AlbumRef {
                title: Some("Discovery".into()),
                cover: Some("https://img/cover".into()),
                cover_medium: Some("https://img/cover-250".into()),
            }),
            Some("https://cdn/preview.mp3"),
        ));
        assert_eq!(track.id, TrackId(3135556));
        assert_eq!(track.album_title, "Discovery");
        assert_eq!(track.cover_url.as_deref(), Some("https://img/cover-250"));
        assert_eq!(track.duration_seconds, 224);
        assert_eq!(track.preview_url.as_deref(), Some("https://cdn/preview.mp3"));
    }

    #[test]
    fn falls_back_to_plain_cover() {
        let track = map_track(&item(
            Some(AlbumRef {
                title: None,
                cover: Some("https://img/cover".into()),
                cover_medium: Some(String::new()),
            }),
            None,
        ));
        assert_eq!(track.cover_url.as_deref(), Some("https://img/cover"));
        assert_eq!(track.album_title, "Unknown Album");
    }

    #[test]
    fn empty_preview_means_no_preview() {
        let track = map_track(&item(None, Some("")));
        assert!(track.preview_url.is_none());
        assert!(track.cover_url.is_none());
    }
}
