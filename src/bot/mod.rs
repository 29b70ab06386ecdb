//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles incoming text, command and media messages
//! - `outbox`: Delivers albums and forwards archive copies
//! - `ui_builder`: Creates keyboards and formats captions

pub mod message_handler;
pub mod outbox;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use message_handler::message_handler;
pub use outbox::TelegramOutbox;

// Re-export utility functions that might be used elsewhere
pub use message_handler::extract_media_item;
pub use ui_builder::{build_archive_caption, done_keyboard, format_file_size, DONE_BUTTON_LABEL};
