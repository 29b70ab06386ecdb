//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::KeyboardRemove as ReplyKeyboardRemove;
use tracing::{debug, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::album_errors::AlbumError;
use crate::collector::MediaCollector;
use crate::media::{MediaItem, MediaKind};

use super::ui_builder::{done_keyboard, DONE_BUTTON_LABEL};

/// Entry point for every incoming message.
///
/// Text is dispatched to the command/button handler; media of any of the
/// six supported kinds is flattened into individual collector arrivals.
/// Anything else is ignored.
pub async fn message_handler(bot: Bot, msg: Message, collector: Arc<MediaCollector>) -> Result<()> {
    if let Some(text) = msg.text() {
        return handle_text_message(&bot, &msg, &collector, text).await;
    }

    if let Some(item) = extract_media_item(&msg) {
        return handle_media_message(&msg, &collector, item).await;
    }

    debug!(chat_id = %msg.chat.id, "ignoring unsupported message kind");
    Ok(())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    collector: &Arc<MediaCollector>,
    text: &str,
) -> Result<()> {
    let chat_id = msg.chat.id;

    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    // Handle /start command
    if text == "/start" {
        let welcome_message = format!(
            "{}\n\n{}\n\n{}\n{}\n{}\n\n{}",
            t_lang("welcome-title", language_code),
            t_lang("welcome-description", language_code),
            t_lang("welcome-step1", language_code),
            t_lang("welcome-step2", language_code),
            t_lang("welcome-step3", language_code),
            t_lang("welcome-final", language_code)
        );
        bot.send_message(chat_id, welcome_message)
            .reply_markup(done_keyboard())
            .await?;
    }
    // Handle /help command
    else if text == "/help" {
        let help_message = vec![
            t_lang("help-title", language_code),
            t_lang("help-step1", language_code),
            t_lang("help-step2", language_code),
            t_lang("help-step3", language_code),
            t_lang("help-step4", language_code),
            t_lang("help-note", language_code),
            t_lang("help-commands", language_code),
        ]
        .join("\n\n");
        bot.send_message(chat_id, help_message).await?;
    }
    // Handle /clear command
    else if text == "/clear" {
        match collector.on_clear(chat_id) {
            Ok(discarded) => {
                info!(chat_id = %chat_id, discarded, "pending media cleared");
            }
            Err(AlbumError::ChatNotFound) => {
                debug!(chat_id = %chat_id, "nothing pending to clear");
            }
            Err(error) => {
                warn!(chat_id = %chat_id, error = %error, "clear failed");
            }
        }
        // The confirmation reads the same whether or not anything was pending
        bot.send_message(chat_id, t_lang("cleared", language_code))
            .await?;
    }
    // Handle the done button (or its command form)
    else if text == DONE_BUTTON_LABEL || text == "/done" {
        handle_done_signal(bot, msg, collector, language_code).await?;
    }
    // Any other text is ignored

    Ok(())
}

async fn handle_done_signal(
    bot: &Bot,
    msg: &Message,
    collector: &Arc<MediaCollector>,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match collector.pending_count(chat_id) {
        Some(count) if count > 0 => {
            let count_str = count.to_string();
            bot.send_message(
                chat_id,
                t_args_lang("album-creating", &[("count", &count_str)], language_code),
            )
            .reply_markup(ReplyKeyboardRemove::new())
            .await?;

            match collector.on_done(chat_id).await {
                Ok(outcome) => {
                    if outcome.failed_groups() > 0 {
                        warn!(
                            chat_id = %chat_id,
                            failed = outcome.failed_groups(),
                            sent = outcome.groups_sent(),
                            "some media groups were not delivered"
                        );
                        bot.send_message(chat_id, t_lang("album-send-partial", language_code))
                            .await?;
                    }
                }
                Err(AlbumError::ChatNotFound) => {
                    // the quiet-period timer won the race; the album is
                    // already on its way
                    debug!(chat_id = %chat_id, "batch already finalized");
                }
                Err(error) => {
                    warn!(chat_id = %chat_id, error = %error, "finalize failed");
                }
            }
        }
        _ => {
            bot.send_message(chat_id, t_lang("no-media-found", language_code))
                .await?;
        }
    }

    Ok(())
}

async fn handle_media_message(
    msg: &Message,
    collector: &Arc<MediaCollector>,
    item: MediaItem,
) -> Result<()> {
    let chat_id = msg.chat.id;
    match collector.on_media_arrival(chat_id, item) {
        Ok(pending) => {
            info!(chat_id = %chat_id, pending, "media added to batch");
        }
        Err(error) => {
            warn!(chat_id = %chat_id, error = %error, "failed to accept media");
        }
    }
    Ok(())
}

/// Build a `MediaItem` from whatever media the message carries.
///
/// Transport-level albums arrive as one message per item, so a single
/// extraction per message is enough.
pub fn extract_media_item(msg: &Message) -> Option<MediaItem> {
    let sender_label = sender_label(msg);
    let caption = msg.caption().map(|c| c.to_string());

    if let Some(photos) = msg.photo() {
        // Last photo in the array is the largest
        let photo = photos.last()?;
        return Some(
            MediaItem::new(MediaKind::Photo, photo.file.id.0.clone(), sender_label)
                .with_caption(caption)
                .with_file_size(u64::from(photo.file.size)),
        );
    }
    if let Some(video) = msg.video() {
        return Some(
            MediaItem::new(MediaKind::Video, video.file.id.0.clone(), sender_label)
                .with_caption(caption)
                .with_filename(video.file_name.clone())
                .with_file_size(u64::from(video.file.size)),
        );
    }
    if let Some(document) = msg.document() {
        return Some(
            MediaItem::new(MediaKind::Document, document.file.id.0.clone(), sender_label)
                .with_caption(caption)
                .with_filename(document.file_name.clone())
                .with_file_size(u64::from(document.file.size)),
        );
    }
    if let Some(animation) = msg.animation() {
        return Some(
            MediaItem::new(
                MediaKind::Animation,
                animation.file.id.0.clone(),
                sender_label,
            )
            .with_caption(caption)
            .with_filename(animation.file_name.clone())
            .with_file_size(u64::from(animation.file.size)),
        );
    }
    if let Some(audio) = msg.audio() {
        return Some(
            MediaItem::new(MediaKind::Audio, audio.file.id.0.clone(), sender_label)
                .with_caption(caption)
                .with_filename(audio.file_name.clone())
                .with_file_size(u64::from(audio.file.size)),
        );
    }
    if let Some(voice) = msg.voice() {
        return Some(
            MediaItem::new(MediaKind::Voice, voice.file.id.0.clone(), sender_label)
                .with_caption(caption)
                .with_file_size(u64::from(voice.file.size)),
        );
    }

    None
}

fn sender_label(msg: &Message) -> String {
    match msg.from.as_ref() {
        Some(user) => {
            let mut user_name = user.first_name.clone();
            if let Some(last_name) = &user.last_name {
                user_name.push(' ');
                user_name.push_str(last_name);
            }
            format!("{} ({})", user_name, user.id)
        }
        None => "unknown".to_string(),
    }
}
