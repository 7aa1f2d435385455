//! Last-call-wins debounce timing for recompute cycles.

use std::time::Duration;
use tokio::{runtime::Handle, task::JoinHandle, time::sleep};

/// Coalesces bursts of recompute requests into a single delayed execution.
///
/// At most one pending execution exists at any time: scheduling aborts and
/// supersedes whatever was pending, so only the most recent call fires. There
/// is no queue of missed executions, and the scheduler does not catch errors
/// from the work it runs. A zero delay executes on the next scheduling
/// opportunity with no debounce window.
pub struct DebounceScheduler {
    handle: Handle,
    pending: Option<JoinHandle<()>>,
}

impl DebounceScheduler {
    pub fn new(handle: Handle) -> Self {
        DebounceScheduler {
            handle,
            pending: None,
        }
    }

    /// Register `work` to run after `delay`, cancelling any pending
    /// execution.
    pub fn schedule<F>(&mut self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.pending = Some(self.handle.spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            work();
        }));
    }

    /// Cancel the pending execution, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
