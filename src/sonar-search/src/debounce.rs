use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs a callback once input has been quiet for a given delay.
///
/// At most one invocation is pending at a time: scheduling again aborts the
/// previous one, which then never runs. Needs a tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }

    /// Drops the pending invocation, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
