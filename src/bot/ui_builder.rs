//! UI Builder module for keyboards and user-facing formatting

use teloxide::types::{KeyboardButton, KeyboardMarkup as ReplyKeyboardMarkup};

use crate::collector::ArchiveRequest;

/// Literal button label; the text handler matches on it verbatim, so it is
/// deliberately not localized
pub const DONE_BUTTON_LABEL: &str = "Done✅, Make album!";

/// Persistent reply keyboard carrying the done button
pub fn done_keyboard() -> ReplyKeyboardMarkup {
    let mut keyboard =
        ReplyKeyboardMarkup::new(vec![vec![KeyboardButton::new(DONE_BUTTON_LABEL)]]);
    keyboard.resize_keyboard = true;
    keyboard
}

/// Format file size to human readable format
pub fn format_file_size(bytes_size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes_size < KB {
        format!("{} B", bytes_size)
    } else if bytes_size < MB {
        format!("{:.2} KB", bytes_size as f64 / KB as f64)
    } else if bytes_size < GB {
        format!("{:.2} MB", bytes_size as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes_size as f64 / GB as f64)
    }
}

/// Caption block attached to every archived copy.
///
/// The sender's original caption (when present) is kept above a separator
/// line so nothing the user wrote is lost in the archive.
pub fn build_archive_caption(request: &ArchiveRequest) -> String {
    let item = &request.item;
    let date_str = chrono::Local::now().format("%Y-%m-%d");

    let info_block = format!(
        "📂 ɴᴀᴍᴇ: {}\n📦 sɪᴢᴇ: {}\n👤 ᴜsᴇʀ: {}\n📅 ᴅᴀᴛᴇ: {}",
        item.filename,
        format_file_size(item.file_size),
        request.sender_label,
        date_str
    );

    match item.caption.as_deref() {
        Some(caption) if !caption.is_empty() => {
            format!("{caption}\n\n━━━━━━━━━━━━━━━━━━━━━━\n\n{info_block}")
        }
        _ => info_block,
    }
}
