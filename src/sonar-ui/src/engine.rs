//! The session object that ties search, playback and input together.
//!
//! Every state change goes through [`Engine::handle`], which runs to
//! completion on a single task. The only suspension points, the catalog
//! search and the audio `play()` completion, run as spawned tasks that post
//! their outcome back as an [`EngineEvent`].

use std::sync::Arc;
use std::time::Duration;

use sonar_audio::{AudioEvent, AudioEventReceiver, AudioResource, AudioResult, SourceId};
use sonar_core::catalog::{CatalogClient, CatalogResult};
use sonar_core::models::{SearchQuery, Track, TrackId};
use sonar_player::{PlayAttempt, PlaybackSession, PlaybackState};
use sonar_search::{Debouncer, SearchCoordinator};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::projector::{self, View};

#[derive(Debug)]
pub enum EngineEvent {
    /// The query text changed (keystroke). Debounced.
    InputChanged(String),
    /// Explicit submit. Searches immediately.
    Submit(String),
    DebounceElapsed {
        ticket: u64,
    },
    SearchSettled {
        query_id: u64,
        result: CatalogResult<Vec<Track>>,
    },
    Activate(TrackId),
    TogglePlayPause,
    DismissNotice,
    Audio(AudioEvent),
    PlaySettled {
        source: SourceId,
        result: AudioResult<()>,
    },
}

pub type EngineSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn engine_channel() -> (EngineSender, EngineReceiver) {
    mpsc::unbounded_channel()
}

/// Forwards resource notifications into the engine's queue.
pub fn forward_audio_events(mut audio: AudioEventReceiver, events: EngineSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = audio.recv().await {
            if events.send(EngineEvent::Audio(event)).is_err() {
                break;
            }
        }
    })
}

pub struct Engine {
    catalog: Arc<dyn CatalogClient>,
    coordinator: SearchCoordinator,
    playback: PlaybackSession,
    debouncer: Debouncer,
    debounce: Duration,
    /// Bumped on every input change or submit; a debounce firing for an
    /// older ticket is ignored.
    input_ticket: u64,
    pending_text: Option<String>,
    notice: Option<String>,
    events: EngineSender,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("catalog", &self.catalog.id())
            .field("coordinator", &self.coordinator)
            .field("playback", &self.playback)
            .field("input_ticket", &self.input_ticket)
            .field("pending_text", &self.pending_text)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        audio: Arc<dyn AudioResource>,
        debounce: Duration,
        events: EngineSender,
    ) -> Self {
        Self {
            catalog,
            coordinator: SearchCoordinator::new(),
            playback: PlaybackSession::new(audio),
            debouncer: Debouncer::new(),
            debounce,
            input_ticket: 0,
            pending_text: None,
            notice: None,
            events,
        }
    }

    pub fn coordinator(&self) -> &SearchCoordinator {
        &self.coordinator
    }

    pub fn playback(&self) -> &PlaybackState {
        self.playback.state()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_search_scheduled(&self) -> bool {
        self.pending_text.is_some() && self.debouncer.is_pending()
    }

    pub fn view(&self) -> View {
        projector::project(
            &self.coordinator,
            self.playback.state(),
            self.notice.as_deref(),
        )
    }

    /// Applies one event. Returns whether the view needs repainting.
    pub fn handle(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::InputChanged(text) => self.input_changed(text),
            EngineEvent::Submit(text) => {
                self.cancel_scheduled();
                self.search(&text)
            }
            EngineEvent::DebounceElapsed { ticket } => {
                if ticket != self.input_ticket {
                    tracing::trace!(ticket, current = self.input_ticket, "superseded debounce");
                    return false;
                }
                match self.pending_text.take() {
                    Some(text) => self.search(&text),
                    None => false,
                }
            }
            EngineEvent::SearchSettled { query_id, result } => {
                self.coordinator.apply_response(query_id, result).is_applied()
            }
            EngineEvent::Activate(id) => self.activate(id),
            EngineEvent::TogglePlayPause => {
                let before = self.playback.state().clone();
                let mut notice_cleared = false;
                if let Some(attempt) = self.playback.toggle_play_pause() {
                    notice_cleared = self.notice.take().is_some();
                    self.drive(attempt);
                }
                notice_cleared || self.playback.state() != &before
            }
            EngineEvent::DismissNotice => {
                let had_notice = self.notice.take().is_some();
                self.coordinator.dismiss_error() || had_notice
            }
            EngineEvent::Audio(event) => {
                let changed = self.playback.handle_audio_event(event);
                if changed {
                    if let PlaybackState::Failed { reason, .. } = self.playback.state() {
                        self.notice = Some(format!("Playback stopped: {reason}."));
                    }
                }
                changed
            }
            EngineEvent::PlaySettled { source, result } => {
                match self.playback.settle_play(source, result) {
                    Some(err) => {
                        self.notice = Some(err.to_string());
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn input_changed(&mut self, text: String) -> bool {
        if text.trim().is_empty() {
            self.cancel_scheduled();
            self.coordinator.submit_query("");
            return true;
        }

        self.input_ticket += 1;
        let ticket = self.input_ticket;
        self.pending_text = Some(text);
        let events = self.events.clone();
        self.debouncer.schedule(self.debounce, move || {
            let _ = events.send(EngineEvent::DebounceElapsed { ticket });
        });
        false
    }

    fn cancel_scheduled(&mut self) {
        self.input_ticket += 1;
        self.pending_text = None;
        self.debouncer.cancel();
    }

    fn search(&mut self, text: &str) -> bool {
        if let Some(query) = self.coordinator.submit_query(text) {
            self.issue(query);
        }
        true
    }

    fn issue(&self, query: SearchQuery) {
        let catalog = self.catalog.clone();
        let events = self.events.clone();
        tracing::info!(query = %query.text, sequence = query.sequence, "searching");
        tokio::spawn(async move {
            let result = catalog.search(&query.text).await;
            let _ = events.send(EngineEvent::SearchSettled {
                query_id: query.sequence,
                result,
            });
        });
    }

    fn activate(&mut self, id: TrackId) -> bool {
        let Some(track) = self
            .coordinator
            .active()
            .and_then(|set| set.find(id))
            .cloned()
        else {
            tracing::warn!(track = %id, "activated track is not in the current results");
            return false;
        };

        self.notice = None;
        if let Some(attempt) = self.playback.activate(&track) {
            self.drive(attempt);
        }
        true
    }

    fn drive(&self, attempt: PlayAttempt) {
        let events = self.events.clone();
        let PlayAttempt { source, completion } = attempt;
        tokio::spawn(async move {
            let result = completion.await;
            let _ = events.send(EngineEvent::PlaySettled { source, result });
        });
    }
}
