//! # Media Collector Module
//!
//! The per-chat batching engine. Incoming media accumulates in a chat's
//! batch until the chat stays quiet for the configured period or the user
//! confirms explicitly; either trigger drives the same finalize path, which
//! partitions the pending sequence into albums and hands them to the
//! outbound sink. Chats are fully isolated from each other: the only shared
//! state is the registry map itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use teloxide::types::ChatId;
use tracing::{debug, warn};

use crate::album_config::AlbumConfig;
use crate::album_errors::AlbumError;
use crate::batch_registry::{BatchRegistry, BatchStatus};
use crate::debounce::DebounceScheduler;
use crate::grouping::partition_into_groups;
use crate::media::MediaItem;

/// One album (or singleton) ready to be delivered back to the chat.
///
/// `is_album` is true only when the group holds more than one item; voice
/// items always travel alone.
#[derive(Debug, Clone)]
pub struct GroupedSendRequest {
    pub chat_id: ChatId,
    pub items: Vec<MediaItem>,
    pub is_album: bool,
}

/// One accepted item to be copied to the archival destination
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub chat_id: ChatId,
    pub item: MediaItem,
    pub sender_label: String,
}

/// Outbound seam between the engine and the transport layer.
///
/// The collector only ever pushes into this sink; nothing the sink does
/// feeds back into batching decisions.
#[async_trait]
pub trait MediaOutbox: Send + Sync {
    /// Deliver one group back to the originating chat
    async fn send_group(&self, request: GroupedSendRequest) -> Result<(), AlbumError>;

    /// Forward one accepted item to the archival destination
    async fn archive(&self, request: ArchiveRequest) -> Result<(), AlbumError>;
}

/// What a finalize pass did: how many items were drained and how each
/// emitted group fared. Group failures are independent; the engine never
/// retries them.
#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    pub item_count: usize,
    pub group_results: Vec<Result<(), AlbumError>>,
}

impl FinalizeOutcome {
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    pub fn groups_sent(&self) -> usize {
        self.group_results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed_groups(&self) -> usize {
        self.group_results.iter().filter(|r| r.is_err()).count()
    }
}

/// Per-chat media batching engine.
///
/// Lives behind an `Arc`: armed debounce timers hold a weak handle back to
/// the collector so a fire after shutdown is a clean no-op.
///
/// # Concurrency
///
/// All state mutation happens under the owning chat's batch lock; no lock
/// is ever held across an await. Stale timer fires are detected by
/// comparing the epoch captured at arm time against the batch's current
/// `armed_epoch`. Epochs come from a process-wide counter and are never
/// reused, so a fire that survived cancellation can never be mistaken for
/// a live one.
pub struct MediaCollector {
    registry: BatchRegistry,
    scheduler: DebounceScheduler,
    config: AlbumConfig,
    outbox: Arc<dyn MediaOutbox>,
    epoch_counter: AtomicU64,
    self_handle: Weak<MediaCollector>,
}

impl MediaCollector {
    pub fn new(config: AlbumConfig, outbox: Arc<dyn MediaOutbox>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            registry: BatchRegistry::new(),
            scheduler: DebounceScheduler::new(),
            config,
            outbox,
            epoch_counter: AtomicU64::new(0),
            self_handle: weak.clone(),
        })
    }

    /// Accept one incoming media item for a chat.
    ///
    /// Appends the item to the chat's batch (creating one if needed),
    /// re-arms the quiet-period timer and fires the archival copy. If the
    /// previous batch is mid-finalization the item starts a brand-new
    /// batch instead; it is never merged into the in-flight album and
    /// never dropped. Returns the number of pending items.
    pub fn on_media_arrival(&self, chat_id: ChatId, item: MediaItem) -> Result<usize, AlbumError> {
        self.spawn_archive(chat_id, &item);

        let pending = loop {
            let batch = self.registry.get_or_create(chat_id);
            let mut guard = batch.lock().unwrap();

            match guard.push(item.clone()) {
                Ok(count) => {
                    // Epoch assignment and re-arm happen under the batch
                    // lock so no same-chat operation can slip between them.
                    let epoch = self.next_epoch();
                    guard.armed_epoch = epoch;

                    let weak = self.self_handle.clone();
                    self.scheduler
                        .arm(chat_id, self.config.quiet_period, async move {
                            if let Some(collector) = weak.upgrade() {
                                collector.on_quiet_period(chat_id, epoch).await;
                            }
                        });
                    break count;
                }
                Err(AlbumError::LateArrival) => {
                    // The finalizer tombstoned and removed this batch;
                    // retrying creates a fresh one for the new burst.
                    drop(guard);
                    debug!(chat_id = %chat_id, "batch is finalizing, starting a new one");
                    continue;
                }
                Err(other) => return Err(other),
            }
        };

        debug!(chat_id = %chat_id, kind = %item.kind, pending, "media accepted");
        Ok(pending)
    }

    /// Explicit confirmation: cancel the pending timer and flush now.
    ///
    /// `Err(ChatNotFound)` when the chat has nothing pending.
    pub async fn on_done(&self, chat_id: ChatId) -> Result<FinalizeOutcome, AlbumError> {
        self.finalize(chat_id).await
    }

    /// Discard the chat's pending batch without emitting anything.
    ///
    /// Cancels the timer and removes the registry entry; returns how many
    /// items were thrown away.
    pub fn on_clear(&self, chat_id: ChatId) -> Result<usize, AlbumError> {
        let batch = self.registry.get(chat_id).ok_or(AlbumError::ChatNotFound)?;
        let mut guard = batch.lock().unwrap();
        if guard.status == BatchStatus::Finalizing {
            return Err(AlbumError::ChatNotFound);
        }

        let discarded = guard.drain_for_finalize().len();
        self.registry.remove(chat_id);
        self.scheduler.cancel(chat_id);
        debug!(chat_id = %chat_id, discarded, "cleared pending media");
        Ok(discarded)
    }

    /// Finalize the chat's current batch immediately
    pub async fn finalize(&self, chat_id: ChatId) -> Result<FinalizeOutcome, AlbumError> {
        self.flush(chat_id, None).await
    }

    /// Items currently pending for the chat, if a live batch exists
    pub fn pending_count(&self, chat_id: ChatId) -> Option<usize> {
        let batch = self.registry.get(chat_id)?;
        let guard = batch.lock().unwrap();
        if guard.status == BatchStatus::Finalizing {
            return None;
        }
        Some(guard.items.len())
    }

    fn next_epoch(&self) -> u64 {
        // 0 is reserved for "no timer armed"
        self.epoch_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn spawn_archive(&self, chat_id: ChatId, item: &MediaItem) {
        let request = ArchiveRequest {
            chat_id,
            item: item.clone(),
            sender_label: item.sender_label.clone(),
        };
        let outbox = Arc::clone(&self.outbox);
        tokio::spawn(async move {
            // best-effort: archival never blocks or fails the album path
            if let Err(error) = outbox.archive(request).await {
                warn!(chat_id = %chat_id, error = %error, "archive forward failed");
            }
        });
    }

    /// Quiet-period fire path for a timer armed with `epoch`
    async fn on_quiet_period(&self, chat_id: ChatId, epoch: u64) {
        match self.flush(chat_id, Some(epoch)).await {
            Ok(outcome) => {
                if !outcome.is_empty() {
                    debug!(
                        chat_id = %chat_id,
                        items = outcome.item_count,
                        groups = outcome.group_results.len(),
                        "quiet period elapsed, batch flushed"
                    );
                }
            }
            Err(AlbumError::ChatNotFound) => {
                // cleared, already flushed, or re-armed since: nothing to do
                debug!(chat_id = %chat_id, epoch, "stale quiet-period fire ignored");
            }
            Err(error) => {
                warn!(chat_id = %chat_id, error = %error, "quiet-period flush failed");
            }
        }
    }

    /// The single finalize implementation behind both triggers.
    ///
    /// `expected_epoch` is set on the timer path: the flush proceeds only
    /// if the batch's armed epoch still matches what the timer captured,
    /// which makes a fire racing a cancel or a newer arrival a no-op.
    async fn flush(
        &self,
        chat_id: ChatId,
        expected_epoch: Option<u64>,
    ) -> Result<FinalizeOutcome, AlbumError> {
        let batch = self.registry.get(chat_id).ok_or(AlbumError::ChatNotFound)?;

        let items = {
            let mut guard = batch.lock().unwrap();
            if guard.status == BatchStatus::Finalizing {
                return Err(AlbumError::ChatNotFound);
            }
            if let Some(epoch) = expected_epoch {
                if guard.armed_epoch != epoch {
                    return Err(AlbumError::ChatNotFound);
                }
            }

            // Drain and unregister before any sending so the chat is free
            // for a brand-new batch the moment the lock drops.
            let items = guard.drain_for_finalize();
            self.registry.remove(chat_id);
            self.scheduler.cancel(chat_id);
            items
        };

        if items.is_empty() {
            return Ok(FinalizeOutcome::default());
        }

        let item_count = items.len();
        let groups = partition_into_groups(items, self.config.max_group_size);
        debug!(
            chat_id = %chat_id,
            item_count,
            groups = groups.len(),
            "finalizing media batch"
        );

        let mut group_results = Vec::with_capacity(groups.len());
        for group in groups {
            let is_album = group.len() > 1;
            let request = GroupedSendRequest {
                chat_id,
                items: group,
                is_album,
            };
            let result = self.outbox.send_group(request).await;
            if let Err(error) = &result {
                // each group is an independent unit of work; siblings
                // still go out and nothing is rolled back or retried
                warn!(chat_id = %chat_id, error = %error, "failed to deliver media group");
            }
            group_results.push(result);
        }

        Ok(FinalizeOutcome {
            item_count,
            group_results,
        })
    }
}
