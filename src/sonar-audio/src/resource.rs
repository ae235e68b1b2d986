use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::mpsc;

/// Audio playback errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("no source bound")]
    NoSource,
    /// The play request was superseded by `pause()` or a new source before
    /// playback started. Not a failure of the track.
    #[error("play request interrupted")]
    Interrupted,
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("audio backend unavailable: {0}")]
    Backend(String),
}

impl AudioError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, AudioError::Interrupted)
    }
}

pub type AudioResult<T> = Result<T, AudioError>;

/// What the resource should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Url(String),
    /// Sentinel bound when a track has no preview; `play()` on it rejects.
    Empty,
}

impl AudioSource {
    pub fn from_preview(preview_url: Option<&str>) -> Self {
        match preview_url {
            Some(url) if !url.is_empty() => AudioSource::Url(url.to_string()),
            _ => AudioSource::Empty,
        }
    }
}

/// Generation of the bound source. Every `set_source` call yields a new id,
/// and every event names the id it was emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEventKind {
    Play,
    Pause,
    Ended,
    Error(String),
}

/// Notification emitted by the resource about what it actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEvent {
    pub source: SourceId,
    pub kind: AudioEventKind,
}

impl AudioEvent {
    pub fn new(source: SourceId, kind: AudioEventKind) -> Self {
        Self { source, kind }
    }
}

pub type AudioEventSender = mpsc::UnboundedSender<AudioEvent>;
pub type AudioEventReceiver = mpsc::UnboundedReceiver<AudioEvent>;

pub fn event_channel() -> (AudioEventSender, AudioEventReceiver) {
    mpsc::unbounded_channel()
}

/// Resolves once the resource has started playing, or with the reason it
/// refused to.
pub type PlayCompletion = BoxFuture<'static, AudioResult<()>>;

/// The single audio-output resource.
///
/// Binding a new source invalidates any in-flight load of the previous one;
/// callers never queue or multiplex loads.
pub trait AudioResource: Send + Sync {
    fn set_source(&self, source: AudioSource) -> SourceId;

    fn play(&self) -> PlayCompletion;

    fn pause(&self);
}
