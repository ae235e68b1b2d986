//! Search-side state: input debouncing and the sequence-gated coordinator
//! that decides which catalog reply may reach the screen.

mod coordinator;
mod debounce;

pub use coordinator::{ResponseOutcome, SearchCoordinator, SearchStatus};
pub use debounce::Debouncer;
