//! # Media Item Model
//!
//! Plain data types describing one unit of incoming media. The collector
//! treats the transport handle as opaque; everything needed to re-send or
//! archive an item travels with it.

/// The six media kinds the bot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Animation,
    Audio,
    Voice,
}

impl MediaKind {
    /// Whether Telegram allows this kind inside a media group.
    ///
    /// Voice messages are rejected by the media-group endpoint, so every
    /// voice item must be sent on its own.
    pub fn is_groupable(&self) -> bool {
        !matches!(self, MediaKind::Voice)
    }

    /// Lowercase tag used in logs and archive captions
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Animation => "animation",
            MediaKind::Audio => "audio",
            MediaKind::Voice => "voice",
        }
    }

    /// Fallback filename for items whose transport metadata carries none
    pub fn default_filename(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo.jpg",
            MediaKind::Video => "video.mp4",
            MediaKind::Document => "document",
            MediaKind::Animation => "animation.gif",
            MediaKind::Audio => "audio.mp3",
            MediaKind::Voice => "voice.ogg",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of incoming media, immutable once built.
///
/// `file_id` is the opaque transport handle Telegram hands back for the
/// upload; it is sufficient to re-send the item later without downloading
/// anything. Caption, filename and size only matter for the archive copy.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub file_id: String,
    pub sender_label: String,
    pub caption: Option<String>,
    pub filename: String,
    pub file_size: u64,
}

impl MediaItem {
    pub fn new(
        kind: MediaKind,
        file_id: impl Into<String>,
        sender_label: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file_id: file_id.into(),
            sender_label: sender_label.into(),
            caption: None,
            filename: kind.default_filename().to_string(),
            file_size: 0,
        }
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        if let Some(name) = filename {
            self.filename = name;
        }
        self
    }

    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }
}
