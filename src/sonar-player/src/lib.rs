//! The playback session: one track at a time on a shared audio resource.

mod session;

pub use session::{PlayAttempt, PlaybackError, PlaybackSession, PlaybackState, NO_PREVIEW_REASON};
