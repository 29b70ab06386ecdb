//! # Batch Registry Module
//!
//! This module provides thread-safe per-chat batch management. The registry
//! is the only cross-chat shared state in the engine; every batch is guarded
//! by its own lock so traffic in one chat never blocks another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use teloxide::types::ChatId;

use crate::album_errors::AlbumError;
use crate::media::MediaItem;

/// Lifecycle state of one chat's batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Accumulating,
    Finalizing,
}

/// Per-chat accumulator of pending media.
///
/// Items are append-only until finalization and keep arrival order.
/// `armed_epoch` identifies the debounce timer currently watching this
/// batch; a fire carrying any other epoch is stale and must be ignored.
/// A batch stays `Finalizing` forever once drained; the state doubles as a
/// tombstone so arrivals still holding the old handle know to start over.
#[derive(Debug)]
pub struct ChatBatch {
    pub items: Vec<MediaItem>,
    pub status: BatchStatus,
    pub armed_epoch: u64,
}

impl ChatBatch {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            status: BatchStatus::Idle,
            armed_epoch: 0,
        }
    }

    /// Append an item, refusing once finalization has begun
    pub fn push(&mut self, item: MediaItem) -> Result<usize, AlbumError> {
        if self.status == BatchStatus::Finalizing {
            return Err(AlbumError::LateArrival);
        }
        self.items.push(item);
        self.status = BatchStatus::Accumulating;
        Ok(self.items.len())
    }

    /// Tombstone the batch and take its items for delivery.
    ///
    /// After this call the batch accepts nothing and matches no timer epoch.
    pub fn drain_for_finalize(&mut self) -> Vec<MediaItem> {
        self.status = BatchStatus::Finalizing;
        self.armed_epoch = 0;
        std::mem::take(&mut self.items)
    }
}

/// Thread-safe registry mapping chat ids to their pending batches
///
/// The outer mutex guards only the map shape (insert/remove/lookup).
/// Batch contents are mutated exclusively under the inner per-batch lock,
/// which is what serializes arrival, done, clear and timer-fire for one
/// chat against each other.
///
/// # Lifecycle
///
/// - A batch is created lazily on the first arrival for its chat
/// - The entry is removed as soon as the batch is finalized or cleared
/// - A removed batch's `Arc` may outlive the entry briefly; its
///   `Finalizing` tombstone keeps late holders honest
pub struct BatchRegistry {
    batches: Mutex<HashMap<ChatId, Arc<Mutex<ChatBatch>>>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(HashMap::new()),
        }
    }

    /// Get the chat's batch, creating an idle one if absent.
    ///
    /// Creation is atomic with respect to concurrent calls for the same
    /// chat: both callers end up holding the same `Arc`.
    pub fn get_or_create(&self, chat_id: ChatId) -> Arc<Mutex<ChatBatch>> {
        let mut batches = self.batches.lock().unwrap();
        if let Some(batch) = batches.get(&chat_id) {
            return Arc::clone(batch);
        }

        log::info!("Creating media batch for chat {chat_id}");
        let batch = Arc::new(Mutex::new(ChatBatch::new()));
        batches.insert(chat_id, Arc::clone(&batch));
        batch
    }

    /// Look up the chat's batch without creating one
    pub fn get(&self, chat_id: ChatId) -> Option<Arc<Mutex<ChatBatch>>> {
        self.batches.lock().unwrap().get(&chat_id).map(Arc::clone)
    }

    /// Drop the chat's entry, returning it if one existed
    pub fn remove(&self, chat_id: ChatId) -> Option<Arc<Mutex<ChatBatch>>> {
        let removed = self.batches.lock().unwrap().remove(&chat_id);
        if removed.is_some() {
            log::info!("Removed media batch for chat {chat_id}");
        }
        removed
    }

    /// Number of chats with a pending batch
    pub fn active_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl Default for BatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
