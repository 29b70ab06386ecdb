//! # Neko Album Maker Bot
//!
//! A Telegram bot that collects bursts of incoming media per chat and
//! repackages them into albums of at most ten items, forwarding a copy of
//! every item to an archive channel tagged with sender metadata.

pub mod album_config;
pub mod album_errors;
pub mod batch_registry;
pub mod bot;
pub mod collector;
pub mod debounce;
pub mod grouping;
pub mod localization;
pub mod media;
