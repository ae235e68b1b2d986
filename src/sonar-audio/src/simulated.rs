use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::resource::{
    AudioError, AudioEvent, AudioEventKind, AudioEventSender, AudioResource, AudioResult,
    AudioSource, PlayCompletion, SourceId,
};

const DEFAULT_LOAD_LATENCY: Duration = Duration::from_millis(150);

/// Headless audio resource that plays nothing but behaves like a media
/// element: loading takes a moment, clips end after `clip_length`, and all
/// state changes are reported as [`AudioEvent`]s.
///
/// `play()` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct SimulatedAudio {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SimState>,
    events: AudioEventSender,
    clip_length: Duration,
    load_latency: Duration,
}

#[derive(Default)]
struct SimState {
    source_id: SourceId,
    source: Option<AudioSource>,
    paused: bool,
    position: Duration,
    started_at: Option<Instant>,
    pending_play: Option<oneshot::Sender<AudioResult<()>>>,
    task: Option<JoinHandle<()>>,
}

impl SimState {
    fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl std::fmt::Debug for SimulatedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SimulatedAudio")
            .field("source_id", &state.source_id)
            .field("source", &state.source)
            .field("paused", &state.paused)
            .field("clip_length", &self.inner.clip_length)
            .finish_non_exhaustive()
    }
}

impl SimulatedAudio {
    pub fn new(events: AudioEventSender, clip_length: Duration) -> Self {
        Self::with_load_latency(events, clip_length, DEFAULT_LOAD_LATENCY)
    }

    pub fn with_load_latency(
        events: AudioEventSender,
        clip_length: Duration,
        load_latency: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SimState {
                    paused: true,
                    ..SimState::default()
                }),
                events,
                clip_length,
                load_latency,
            }),
        }
    }

    pub fn current_source(&self) -> SourceId {
        self.inner.lock().source_id
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, source: SourceId, kind: AudioEventKind) {
        tracing::trace!(%source, ?kind, "simulated audio event");
        // The receiver only goes away on shutdown.
        let _ = self.events.send(AudioEvent::new(source, kind));
    }

    /// Stops the running clip task and settles any pending play request as
    /// interrupted. Returns whether the resource was playing.
    fn halt(&self, state: &mut SimState) -> bool {
        if let Some(task) = state.task.take() {
            task.abort();
        }
        if let Some(started) = state.started_at.take() {
            state.position += started.elapsed();
        }
        if let Some(pending) = state.pending_play.take() {
            let _ = pending.send(Err(AudioError::Interrupted));
        }
        let was_playing = !state.paused;
        state.paused = true;
        was_playing
    }

    async fn run_clip(self: Arc<Self>, source: SourceId) {
        tokio::time::sleep(self.load_latency).await;
        let remaining = {
            let mut state = self.lock();
            if state.source_id != source || state.paused {
                return;
            }
            state.started_at = Some(Instant::now());
            if let Some(pending) = state.pending_play.take() {
                let _ = pending.send(Ok(()));
            }
            self.emit(source, AudioEventKind::Play);
            self.clip_length.saturating_sub(state.position)
        };

        tokio::time::sleep(remaining).await;

        let mut state = self.lock();
        if state.source_id != source || state.paused {
            return;
        }
        state.task = None;
        state.started_at = None;
        state.position = self.clip_length;
        state.paused = true;
        self.emit(source, AudioEventKind::Ended);
    }
}

impl AudioResource for SimulatedAudio {
    fn set_source(&self, source: AudioSource) -> SourceId {
        let mut state = self.inner.lock();
        let previous = state.source_id;
        if self.inner.halt(&mut state) {
            self.inner.emit(previous, AudioEventKind::Pause);
        }
        state.source_id = SourceId(previous.0 + 1);
        state.source = Some(source);
        state.position = Duration::ZERO;
        tracing::debug!(source = %state.source_id, "bound new audio source");
        state.source_id
    }

    fn play(&self) -> PlayCompletion {
        let mut state = self.inner.lock();
        match &state.source {
            None => return futures::future::ready(Err(AudioError::NoSource)).boxed(),
            Some(AudioSource::Empty) => {
                return futures::future::ready(Err(AudioError::UnsupportedSource(
                    "empty source".into(),
                )))
                .boxed()
            }
            Some(AudioSource::Url(_)) => {}
        }
        if state.is_active() {
            return futures::future::ready(Ok(())).boxed();
        }
        if state.position >= self.inner.clip_length {
            state.position = Duration::ZERO;
        }

        let (tx, rx) = oneshot::channel();
        state.paused = false;
        state.pending_play = Some(tx);
        let source = state.source_id;
        state.task = Some(tokio::spawn(self.inner.clone().run_clip(source)));

        async move { rx.await.unwrap_or(Err(AudioError::Interrupted)) }.boxed()
    }

    fn pause(&self) {
        let mut state = self.inner.lock();
        let source = state.source_id;
        if self.inner.halt(&mut state) {
            self.inner.emit(source, AudioEventKind::Pause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{event_channel, AudioEventReceiver};

    fn audio() -> (SimulatedAudio, AudioEventReceiver) {
        let (tx, rx) = event_channel();
        let audio =
            SimulatedAudio::with_load_latency(tx, Duration::from_secs(30), Duration::from_millis(100));
        (audio, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn play_emits_play_then_ended() {
        let (audio, mut rx) = audio();
        let source = audio.set_source(AudioSource::Url("https://cdn/a.mp3".into()));

        audio.play().await.expect("play should start");
        assert_eq!(
            rx.recv().await,
            Some(AudioEvent::new(source, AudioEventKind::Play))
        );

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(
            rx.recv().await,
            Some(AudioEvent::new(source, AudioEventKind::Ended))
        );
        assert!(audio.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_source_rejects_play() {
        let (audio, mut rx) = audio();
        audio.set_source(AudioSource::Empty);

        let err = audio.play().await.expect_err("no preview to play");
        assert!(matches!(err, AudioError::UnsupportedSource(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn play_without_source_rejects() {
        let (audio, _rx) = audio();
        assert_eq!(audio.play().await, Err(AudioError::NoSource));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_before_start_interrupts_play() {
        let (audio, mut rx) = audio();
        let source = audio.set_source(AudioSource::Url("https://cdn/a.mp3".into()));

        let completion = audio.play();
        audio.pause();
        assert_eq!(completion.await, Err(AudioError::Interrupted));
        assert_eq!(
            rx.recv().await,
            Some(AudioEvent::new(source, AudioEventKind::Pause))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rebinding_pauses_previous_source() {
        let (audio, mut rx) = audio();
        let first = audio.set_source(AudioSource::Url("https://cdn/a.mp3".into()));
        audio.play().await.expect("play");
        assert_eq!(rx.recv().await.map(|e| e.kind), Some(AudioEventKind::Play));

        let second = audio.set_source(AudioSource::Url("https://cdn/b.mp3".into()));
        assert_ne!(first, second);
        assert_eq!(
            rx.recv().await,
            Some(AudioEvent::new(first, AudioEventKind::Pause))
        );
        assert_eq!(audio.current_source(), second);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_continues_from_position() {
        let (audio, mut rx) = audio();
        let source = audio.set_source(AudioSource::Url("https://cdn/a.mp3".into()));
        audio.play().await.expect("play");
        rx.recv().await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        audio.pause();
        assert_eq!(rx.recv().await.map(|e| e.kind), Some(AudioEventKind::Pause));

        audio.play().await.expect("resume");
        assert_eq!(rx.recv().await.map(|e| e.kind), Some(AudioEventKind::Play));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(
            rx.recv().await,
            Some(AudioEvent::new(source, AudioEventKind::Ended))
        );
    }
}
