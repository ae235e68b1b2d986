mod resource;
mod simulated;

pub use resource::{
    event_channel, AudioError, AudioEvent, AudioEventKind, AudioEventReceiver, AudioEventSender,
    AudioResource, AudioResult, AudioSource, PlayCompletion, SourceId,
};
pub use simulated::SimulatedAudio;
