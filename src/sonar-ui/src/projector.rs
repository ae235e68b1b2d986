//! Pure mapping from engine state to render instructions. Nothing here
//! holds or mutates state; the render target repaints from a [`View`].

use sonar_core::models::{NowPlaying, Track};
use sonar_player::PlaybackState;
use sonar_search::{SearchCoordinator, SearchStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub track: Track,
    /// The session's current track, whatever its state.
    pub is_active: bool,
    pub is_active_and_playing: bool,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerBarView {
    pub visible: bool,
    pub track: Option<NowPlaying>,
    pub is_playing: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Search,
    Playback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub status: SearchStatus,
    pub cards: Vec<CardView>,
    pub player: PlayerBarView,
    pub banners: Vec<Banner>,
}

impl View {
    pub fn playing_cards(&self) -> impl Iterator<Item = &CardView> {
        self.cards.iter().filter(|card| card.is_active_and_playing)
    }
}

pub fn project(
    search: &SearchCoordinator,
    playback: &PlaybackState,
    playback_notice: Option<&str>,
) -> View {
    let status = search.status().clone();
    let show_cards = matches!(
        status,
        SearchStatus::Results | SearchStatus::Loading { .. } | SearchStatus::Error { .. }
    );
    let cards = match search.active() {
        Some(set) if show_cards => set
            .tracks
            .iter()
            .map(|track| card(track, playback))
            .collect(),
        _ => Vec::new(),
    };

    let mut banners = Vec::new();
    if let Some(message) = status.error_message() {
        banners.push(Banner {
            kind: BannerKind::Search,
            message: message.to_string(),
        });
    }
    if let Some(message) = playback_notice {
        banners.push(Banner {
            kind: BannerKind::Playback,
            message: message.to_string(),
        });
    }

    View {
        status,
        cards,
        player: player_bar(playback),
        banners,
    }
}

pub fn card(track: &Track, playback: &PlaybackState) -> CardView {
    let is_active = playback.track_id() == Some(track.id);
    CardView {
        track: track.clone(),
        is_active,
        is_active_and_playing: is_active && playback.is_playing(),
        duration: format_duration(track.duration_seconds),
    }
}

pub fn player_bar(playback: &PlaybackState) -> PlayerBarView {
    PlayerBarView {
        visible: playback.track().is_some(),
        track: playback.track().cloned(),
        is_playing: playback.is_playing(),
        is_loading: playback.is_loading(),
    }
}

/// `m:ss`
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
