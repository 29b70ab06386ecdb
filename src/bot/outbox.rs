//! Telegram Outbox module
//!
//! Implements the collector's outbound seam on top of the Bot API: albums
//! go out through `send_media_group`, singletons through the kind-specific
//! send method, and every accepted item is mirrored to the archive channel
//! with a sender-info caption.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InputFile, InputMedia, InputMediaAnimation, InputMediaAudio, InputMediaDocument,
    InputMediaPhoto, InputMediaVideo,
};
use tracing::{info, warn};

use super::ui_builder::build_archive_caption;
use crate::album_errors::AlbumError;
use crate::collector::{ArchiveRequest, GroupedSendRequest, MediaOutbox};
use crate::media::{MediaItem, MediaKind};

/// Outbound sink backed by the live Telegram connection
pub struct TelegramOutbox {
    bot: Bot,
    archive_channel: Option<ChatId>,
}

impl TelegramOutbox {
    pub fn new(bot: Bot, archive_channel: Option<ChatId>) -> Self {
        Self {
            bot,
            archive_channel,
        }
    }

    fn input_file(item: &MediaItem) -> InputFile {
        InputFile::file_id(FileId(item.file_id.clone()))
    }

    /// Re-send one item on its own, outside any media group
    async fn send_single(
        &self,
        chat_id: ChatId,
        item: &MediaItem,
    ) -> Result<(), teloxide::RequestError> {
        let file = Self::input_file(item);
        match item.kind {
            MediaKind::Photo => {
                self.bot.send_photo(chat_id, file).await?;
            }
            MediaKind::Video => {
                self.bot.send_video(chat_id, file).await?;
            }
            MediaKind::Document => {
                self.bot.send_document(chat_id, file).await?;
            }
            MediaKind::Animation => {
                self.bot.send_animation(chat_id, file).await?;
            }
            MediaKind::Audio => {
                self.bot.send_audio(chat_id, file).await?;
            }
            MediaKind::Voice => {
                self.bot.send_voice(chat_id, file).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MediaOutbox for TelegramOutbox {
    async fn send_group(&self, request: GroupedSendRequest) -> Result<(), AlbumError> {
        if !request.is_album {
            let item = request
                .items
                .first()
                .ok_or_else(|| AlbumError::SendFailure("empty media group".to_string()))?;
            self.send_single(request.chat_id, item)
                .await
                .map_err(|e| AlbumError::SendFailure(e.to_string()))?;
            info!(chat_id = %request.chat_id, kind = %item.kind, "single media delivered");
            return Ok(());
        }

        let mut media_group = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let file = Self::input_file(item);
            let media = match item.kind {
                MediaKind::Photo => InputMedia::Photo(InputMediaPhoto::new(file)),
                MediaKind::Video => InputMedia::Video(InputMediaVideo::new(file)),
                MediaKind::Document => InputMedia::Document(InputMediaDocument::new(file)),
                MediaKind::Animation => InputMedia::Animation(InputMediaAnimation::new(file)),
                MediaKind::Audio => InputMedia::Audio(InputMediaAudio::new(file)),
                MediaKind::Voice => {
                    // grouping never places voice inside an album; if one
                    // slips through it still goes out on its own
                    self.send_single(request.chat_id, item)
                        .await
                        .map_err(|e| AlbumError::SendFailure(e.to_string()))?;
                    continue;
                }
            };
            media_group.push(media);
        }

        self.bot
            .send_media_group(request.chat_id, media_group)
            .await
            .map_err(|e| AlbumError::SendFailure(e.to_string()))?;

        info!(
            chat_id = %request.chat_id,
            items = request.items.len(),
            "media group delivered"
        );
        Ok(())
    }

    async fn archive(&self, request: ArchiveRequest) -> Result<(), AlbumError> {
        let Some(channel) = self.archive_channel else {
            warn!("DB_CHANNEL_ID not set - skipping archive forward");
            return Ok(());
        };

        let caption = build_archive_caption(&request);
        let file = Self::input_file(&request.item);

        let result = match request.item.kind {
            MediaKind::Photo => self
                .bot
                .send_photo(channel, file)
                .caption(caption.clone())
                .await
                .map(|_| ()),
            MediaKind::Video => self
                .bot
                .send_video(channel, file)
                .caption(caption.clone())
                .await
                .map(|_| ()),
            MediaKind::Document => self
                .bot
                .send_document(channel, file)
                .caption(caption.clone())
                .await
                .map(|_| ()),
            MediaKind::Animation => self
                .bot
                .send_animation(channel, file)
                .caption(caption.clone())
                .await
                .map(|_| ()),
            MediaKind::Audio => self
                .bot
                .send_audio(channel, file)
                .caption(caption.clone())
                .await
                .map(|_| ()),
            MediaKind::Voice => self
                .bot
                .send_voice(channel, file)
                .caption(caption.clone())
                .await
                .map(|_| ()),
        };

        result.map_err(|e| AlbumError::ArchiveFailure(e.to_string()))?;
        info!(
            chat_id = %request.chat_id,
            kind = %request.item.kind,
            "media archived to channel"
        );
        Ok(())
    }
}
