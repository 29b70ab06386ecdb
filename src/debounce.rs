//! # Debounce Scheduler Module
//!
//! Per-chat single-shot inactivity timers. Every new arrival re-arms its
//! chat's timer; when a chat stays quiet for the whole period the armed
//! fire path runs. Cancellation aborts the waiting task only: once a fire
//! path has been detached it can no longer be killed halfway through, and
//! staleness is decided by the collector's epoch check instead.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use teloxide::types::ChatId;
use tokio::task::JoinHandle;
use tracing::trace;

/// Arms, re-arms and cancels one inactivity timer per chat
pub struct DebounceScheduler {
    timers: Mutex<HashMap<ChatId, JoinHandle<()>>>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or restart) the chat's quiet-period timer.
    ///
    /// Any previously armed timer for the same chat is aborted and
    /// replaced, so at most one timer watches a chat at any instant.
    /// The sleep and the fire path live in separate tasks: aborting the
    /// outer task either stops the sleep or does nothing at all, so it can
    /// never interrupt `on_fire` once it has started.
    pub fn arm<F>(&self, chat_id: ChatId, quiet_period: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            tokio::spawn(on_fire);
        });

        let mut timers = self.timers.lock().unwrap();
        if let Some(previous) = timers.insert(chat_id, handle) {
            trace!(chat_id = chat_id.0, "replacing armed debounce timer");
            previous.abort();
        }
    }

    /// Abort and forget the chat's timer, if one is armed.
    ///
    /// A timer whose sleep already elapsed is unaffected; its detached
    /// fire path is expected to notice it is stale and do nothing.
    pub fn cancel(&self, chat_id: ChatId) {
        if let Some(handle) = self.timers.lock().unwrap().remove(&chat_id) {
            trace!(chat_id = chat_id.0, "cancelling debounce timer");
            handle.abort();
        }
    }

    /// Number of chats with a timer entry (armed or already fired)
    pub fn timer_count(&self) -> usize {
        self.timers.lock().unwrap().len()
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new()
    }
}
