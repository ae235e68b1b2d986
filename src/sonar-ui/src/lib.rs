//! Terminal front end: the engine that owns the search and playback state,
//! the pure view projection, and the ratatui render loop.

pub mod app;
pub mod engine;
pub mod help;
pub mod projector;
pub mod theme;

pub use app::{run_ui, UiContext, UiError};
pub use engine::{engine_channel, forward_audio_events, Engine, EngineEvent};
pub use projector::{project, Banner, BannerKind, CardView, PlayerBarView, View};
pub use theme::Theme;
