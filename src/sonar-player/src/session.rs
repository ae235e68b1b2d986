use std::sync::Arc;

use sonar_audio::{
    AudioEvent, AudioEventKind, AudioResource, AudioResult, AudioSource, PlayCompletion, SourceId,
};
use sonar_core::models::{NowPlaying, Track, TrackId};
use thiserror::Error;

/// Reason recorded on the session when the resource refuses to play.
pub const NO_PREVIEW_REASON: &str = "no preview available";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading(NowPlaying),
    Playing(NowPlaying),
    Paused(NowPlaying),
    Failed {
        track: NowPlaying,
        reason: String,
    },
}

impl PlaybackState {
    pub fn track(&self) -> Option<&NowPlaying> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Loading(track)
            | PlaybackState::Playing(track)
            | PlaybackState::Paused(track)
            | PlaybackState::Failed { track, .. } => Some(track),
        }
    }

    pub fn track_id(&self) -> Option<TrackId> {
        self.track().map(|t| t.id)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PlaybackState::Loading(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackState::Failed { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading(_) => "loading",
            PlaybackState::Playing(_) => "playing",
            PlaybackState::Paused(_) => "paused",
            PlaybackState::Failed { .. } => "failed",
        }
    }
}

/// Playback failures surfaced to the user as a non-blocking notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Unable to play this track. No preview available.")]
    NoPreview { track: TrackId },
}

/// A play request the caller must drive to completion and report back via
/// [`PlaybackSession::settle_play`].
pub struct PlayAttempt {
    pub source: SourceId,
    pub completion: PlayCompletion,
}

impl std::fmt::Debug for PlayAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayAttempt")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// The one playback session. Wraps the shared audio resource and keeps the
/// state the player bar and cards are rendered from.
pub struct PlaybackSession {
    audio: Arc<dyn AudioResource>,
    state: PlaybackState,
    source: Option<SourceId>,
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &self.state)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl PlaybackSession {
    pub fn new(audio: Arc<dyn AudioResource>) -> Self {
        Self {
            audio,
            state: PlaybackState::Idle,
            source: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_track(&self) -> Option<&NowPlaying> {
        self.state.track()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    /// Card activation. The loaded track toggles; any other track replaces
    /// it.
    pub fn activate(&mut self, track: &Track) -> Option<PlayAttempt> {
        if self.state.track_id() == Some(track.id) {
            return self.toggle_play_pause();
        }
        Some(self.load(NowPlaying::from(track)))
    }

    pub fn toggle_play_pause(&mut self) -> Option<PlayAttempt> {
        match &self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing(_) | PlaybackState::Loading(_) => {
                tracing::debug!("pause requested");
                self.audio.pause();
                None
            }
            PlaybackState::Paused(track) => match self.source {
                Some(source) => {
                    tracing::debug!(%source, "resume requested");
                    Some(PlayAttempt {
                        source,
                        completion: self.audio.play(),
                    })
                }
                None => {
                    let track = track.clone();
                    Some(self.load(track))
                }
            },
            PlaybackState::Failed { track, .. } => {
                let track = track.clone();
                tracing::debug!(track = %track.id, "retrying failed track");
                Some(self.load(track))
            }
        }
    }

    fn load(&mut self, track: NowPlaying) -> PlayAttempt {
        let source = self
            .audio
            .set_source(AudioSource::from_preview(track.preview_url.as_deref()));
        tracing::info!(track = %track.id, title = %track.title, %source, "loading preview");
        self.source = Some(source);
        self.state = PlaybackState::Loading(track);
        PlayAttempt {
            source,
            completion: self.audio.play(),
        }
    }

    /// Applies a resource notification. Returns whether the state changed.
    ///
    /// Events are authoritative for playing/paused; events for a source that
    /// has since been replaced are dropped.
    pub fn handle_audio_event(&mut self, event: AudioEvent) -> bool {
        if self.source != Some(event.source) {
            tracing::trace!(source = %event.source, kind = ?event.kind, "dropping stale audio event");
            return false;
        }
        let Some(track) = self.state.track().cloned() else {
            return false;
        };

        let next = match (event.kind, &self.state) {
            (AudioEventKind::Play, _) => PlaybackState::Playing(track),
            (AudioEventKind::Pause, PlaybackState::Playing(_) | PlaybackState::Loading(_)) => {
                PlaybackState::Paused(track)
            }
            (AudioEventKind::Pause, _) => return false,
            // Finished clips stay in the player bar.
            (AudioEventKind::Ended, _) => PlaybackState::Paused(track),
            (AudioEventKind::Error(reason), PlaybackState::Playing(_) | PlaybackState::Loading(_)) => {
                tracing::warn!(track = %track.id, %reason, "audio resource error");
                PlaybackState::Failed { track, reason }
            }
            (AudioEventKind::Error(_), _) => return false,
        };
        self.transition(next)
    }

    /// Reports the outcome of a [`PlayAttempt`]. Rejections of the current
    /// source fail the track; interrupted or stale attempts are ignored.
    pub fn settle_play(
        &mut self,
        source: SourceId,
        result: AudioResult<()>,
    ) -> Option<PlaybackError> {
        if self.source != Some(source) {
            return None;
        }
        let err = match result {
            Ok(()) => return None,
            Err(err) if err.is_interrupted() => {
                tracing::debug!(%source, "play request interrupted");
                return None;
            }
            Err(err) => err,
        };
        let track = self.state.track()?.clone();
        tracing::warn!(track = %track.id, error = %err, "preview playback rejected");
        let id = track.id;
        self.transition(PlaybackState::Failed {
            track,
            reason: NO_PREVIEW_REASON.to_string(),
        });
        Some(PlaybackError::NoPreview { track: id })
    }

    fn transition(&mut self, next: PlaybackState) -> bool {
        if self.state == next {
            return false;
        }
        tracing::debug!(from = self.state.label(), to = next.label(), "playback transition");
        self.state = next;
        true
    }
}
