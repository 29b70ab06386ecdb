//! # Collector Integration Tests
//!
//! End-to-end scenarios for the batching engine, driven through a recording
//! outbox double. Tokio time is paused so quiet periods elapse instantly and
//! deterministically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use teloxide::types::ChatId;

use neko_album::album_config::AlbumConfig;
use neko_album::album_errors::AlbumError;
use neko_album::collector::{ArchiveRequest, GroupedSendRequest, MediaCollector, MediaOutbox};
use neko_album::media::{MediaItem, MediaKind};

/// Records everything the collector emits; optionally fails group sends
#[derive(Default)]
struct RecordingOutbox {
    groups: Mutex<Vec<GroupedSendRequest>>,
    archives: Mutex<Vec<ArchiveRequest>>,
    fail_sends: AtomicBool,
}

impl RecordingOutbox {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn group_count(&self) -> usize {
        self.groups.lock().unwrap().len()
    }

    fn group_sizes(&self) -> Vec<usize> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .map(|g| g.items.len())
            .collect()
    }

    fn album_flags(&self) -> Vec<bool> {
        self.groups.lock().unwrap().iter().map(|g| g.is_album).collect()
    }

    fn delivered_order(&self, chat_id: ChatId) -> Vec<String> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.chat_id == chat_id)
            .flat_map(|g| g.items.iter().map(|item| item.file_id.clone()))
            .collect()
    }

    fn archived_count(&self) -> usize {
        self.archives.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaOutbox for RecordingOutbox {
    async fn send_group(&self, request: GroupedSendRequest) -> Result<(), AlbumError> {
        // record every attempt, even failed ones
        self.groups.lock().unwrap().push(request);
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AlbumError::SendFailure(
                "simulated transport failure".to_string(),
            ));
        }
        Ok(())
    }

    async fn archive(&self, request: ArchiveRequest) -> Result<(), AlbumError> {
        self.archives.lock().unwrap().push(request);
        Ok(())
    }
}

fn collector_with(outbox: &Arc<RecordingOutbox>) -> Arc<MediaCollector> {
    MediaCollector::new(AlbumConfig::default(), Arc::clone(outbox) as Arc<dyn MediaOutbox>)
}

fn media(kind: MediaKind, file_id: String) -> MediaItem {
    MediaItem::new(kind, file_id, "Tester (1)")
}

fn photo(n: usize) -> MediaItem {
    media(MediaKind::Photo, format!("photo-{n}"))
}

fn voice(n: usize) -> MediaItem {
    media(MediaKind::Voice, format!("voice-{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 25 arrivals, no done signal: the quiet period alone produces
    /// exactly one finalize with groups of [10, 10, 5] in arrival order
    #[tokio::test(start_paused = true)]
    async fn test_quiet_period_flushes_into_album_groups() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(100);

        for n in 0..25 {
            collector.on_media_arrival(chat, photo(n)).unwrap();
        }
        assert_eq!(collector.pending_count(chat), Some(25));
        assert_eq!(outbox.group_count(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(outbox.group_sizes(), vec![10, 10, 5]);
        assert_eq!(outbox.album_flags(), vec![true, true, true]);

        let expected: Vec<String> = (0..25).map(|n| format!("photo-{n}")).collect();
        assert_eq!(outbox.delivered_order(chat), expected);

        // the chat is free again
        assert_eq!(collector.pending_count(chat), None);
    }

    /// [photo, voice, photo, photo] + done: voice never joins an album
    #[tokio::test(start_paused = true)]
    async fn test_voice_items_are_always_singleton_groups() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(200);

        collector.on_media_arrival(chat, photo(0)).unwrap();
        collector.on_media_arrival(chat, voice(1)).unwrap();
        collector.on_media_arrival(chat, photo(2)).unwrap();
        collector.on_media_arrival(chat, photo(3)).unwrap();

        let outcome = collector.on_done(chat).await.unwrap();
        assert_eq!(outcome.item_count, 4);
        assert_eq!(outcome.group_results.len(), 3);
        assert_eq!(outcome.failed_groups(), 0);

        assert_eq!(outbox.group_sizes(), vec![1, 1, 2]);
        assert_eq!(outbox.album_flags(), vec![false, false, true]);

        let groups = outbox.groups.lock().unwrap();
        assert_eq!(groups[0].items[0].kind, MediaKind::Photo);
        assert_eq!(groups[1].items[0].kind, MediaKind::Voice);
        assert_eq!(groups[2].items[0].kind, MediaKind::Photo);
        assert_eq!(groups[2].items[1].kind, MediaKind::Photo);
    }

    /// Done cancels the pending timer; a stale fire never double-finalizes
    #[tokio::test(start_paused = true)]
    async fn test_done_cancels_timer_and_never_double_finalizes() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(300);

        for n in 0..3 {
            collector.on_media_arrival(chat, photo(n)).unwrap();
        }

        let outcome = collector.on_done(chat).await.unwrap();
        assert_eq!(outcome.item_count, 3);
        assert_eq!(outbox.group_count(), 1);

        // a second done finds nothing
        assert!(matches!(
            collector.on_done(chat).await,
            Err(AlbumError::ChatNotFound)
        ));

        // well past the original quiet period: still exactly one finalize
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(outbox.group_count(), 1);
    }

    /// Clear throws pending media away without emitting anything
    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_pending_media() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(400);

        collector.on_media_arrival(chat, photo(0)).unwrap();
        collector.on_media_arrival(chat, photo(1)).unwrap();

        assert_eq!(collector.on_clear(chat).unwrap(), 2);
        assert_eq!(collector.pending_count(chat), None);

        // a timer firing after the clear finds nothing to flush
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(outbox.group_count(), 0);

        // clearing again is a benign error
        assert!(matches!(
            collector.on_clear(chat),
            Err(AlbumError::ChatNotFound)
        ));

        // the next arrival starts a fresh batch
        assert_eq!(collector.on_media_arrival(chat, photo(2)).unwrap(), 1);
        assert_eq!(collector.pending_count(chat), Some(1));
    }

    /// Two chats never interleave each other's sequences or timers
    #[tokio::test(start_paused = true)]
    async fn test_chats_are_isolated() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat_a = ChatId(500);
        let chat_b = ChatId(501);

        collector
            .on_media_arrival(chat_a, media(MediaKind::Photo, "a-0".into()))
            .unwrap();
        collector
            .on_media_arrival(chat_b, media(MediaKind::Photo, "b-0".into()))
            .unwrap();
        collector
            .on_media_arrival(chat_a, media(MediaKind::Photo, "a-1".into()))
            .unwrap();
        collector
            .on_media_arrival(chat_b, media(MediaKind::Photo, "b-1".into()))
            .unwrap();
        collector
            .on_media_arrival(chat_a, media(MediaKind::Photo, "a-2".into()))
            .unwrap();

        assert_eq!(collector.pending_count(chat_a), Some(3));
        assert_eq!(collector.pending_count(chat_b), Some(2));

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(outbox.delivered_order(chat_a), vec!["a-0", "a-1", "a-2"]);
        assert_eq!(outbox.delivered_order(chat_b), vec!["b-0", "b-1"]);
        assert_eq!(collector.pending_count(chat_a), None);
        assert_eq!(collector.pending_count(chat_b), None);
    }

    /// Every arrival pushes the deadline out by a full quiet period
    #[tokio::test(start_paused = true)]
    async fn test_arrival_restarts_quiet_period() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(600);

        collector.on_media_arrival(chat, photo(0)).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(outbox.group_count(), 0);

        // re-arm at t=1.5s pushes the deadline to t=3.5s
        collector.on_media_arrival(chat, photo(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(outbox.group_count(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(outbox.group_sizes(), vec![2]);
        assert_eq!(outbox.delivered_order(chat), vec!["photo-0", "photo-1"]);
    }

    /// A rejected group is reported per group and never blocks siblings
    #[tokio::test(start_paused = true)]
    async fn test_send_failures_are_independent_per_group() {
        let outbox = RecordingOutbox::new();
        outbox.fail_sends.store(true, Ordering::SeqCst);
        let collector = collector_with(&outbox);
        let chat = ChatId(700);

        for n in 0..12 {
            collector.on_media_arrival(chat, photo(n)).unwrap();
        }

        let outcome = collector.on_done(chat).await.unwrap();
        assert_eq!(outcome.item_count, 12);
        assert_eq!(outcome.group_results.len(), 2);
        assert_eq!(outcome.failed_groups(), 2);
        assert_eq!(outcome.groups_sent(), 0);

        // both groups were attempted despite the first failure
        assert_eq!(outbox.group_sizes(), vec![10, 2]);

        // the batch is gone either way; the engine does not retry
        assert_eq!(collector.pending_count(chat), None);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(outbox.group_count(), 2);
    }

    /// One archive copy per accepted item, decoupled from finalization
    #[tokio::test(start_paused = true)]
    async fn test_archive_copy_per_accepted_item() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(800);

        collector.on_media_arrival(chat, photo(0)).unwrap();
        collector.on_media_arrival(chat, voice(1)).unwrap();
        collector
            .on_media_arrival(chat, media(MediaKind::Document, "doc-2".into()))
            .unwrap();

        // let the fire-and-forget archive tasks run
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(outbox.archived_count(), 3);
        {
            let archives = outbox.archives.lock().unwrap();
            assert!(archives.iter().all(|a| a.chat_id == chat));
            assert!(archives.iter().all(|a| a.sender_label == "Tester (1)"));
        }

        // clearing the batch afterwards does not undo the archive copies
        assert_eq!(collector.on_clear(chat).unwrap(), 3);
        assert_eq!(outbox.archived_count(), 3);
        assert_eq!(outbox.group_count(), 0);
    }

    /// Done and clear with nothing pending are benign no-ops
    #[tokio::test(start_paused = true)]
    async fn test_signals_without_batch_are_no_ops() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(900);

        assert!(matches!(
            collector.on_done(chat).await,
            Err(AlbumError::ChatNotFound)
        ));
        assert!(matches!(
            collector.on_clear(chat),
            Err(AlbumError::ChatNotFound)
        ));
        assert_eq!(outbox.group_count(), 0);
    }

    /// A chat is free for a brand-new batch as soon as one is finalized
    #[tokio::test(start_paused = true)]
    async fn test_arrival_after_finalize_starts_fresh_batch() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(1000);

        collector.on_media_arrival(chat, photo(0)).unwrap();
        collector.on_media_arrival(chat, photo(1)).unwrap();
        collector.on_done(chat).await.unwrap();

        assert_eq!(collector.on_media_arrival(chat, photo(2)).unwrap(), 1);
        assert_eq!(collector.pending_count(chat), Some(1));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(outbox.group_sizes(), vec![2, 1]);
        assert_eq!(outbox.album_flags(), vec![true, false]);
        assert_eq!(
            outbox.delivered_order(chat),
            vec!["photo-0", "photo-1", "photo-2"]
        );
    }

    /// An empty finalize emits nothing (guard against spurious fires)
    #[tokio::test(start_paused = true)]
    async fn test_finalize_with_empty_sequence_emits_nothing() {
        let outbox = RecordingOutbox::new();
        let collector = collector_with(&outbox);
        let chat = ChatId(1100);

        collector.on_media_arrival(chat, photo(0)).unwrap();
        assert_eq!(collector.on_clear(chat).unwrap(), 1);

        // nothing pending: the old timer's fire and a fresh done both
        // produce zero grouped sends
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(outbox.group_count(), 0);
        assert!(matches!(
            collector.on_done(chat).await,
            Err(AlbumError::ChatNotFound)
        ));
    }
}
