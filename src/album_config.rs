//! # Album Configuration Module
//!
//! This module defines the tunables for the per-chat batching engine:
//! how long a chat has to stay quiet before its batch is flushed, and how
//! many items one album may carry.

use std::time::Duration;

// Constants for album collection
pub const DEFAULT_QUIET_PERIOD_SECS: u64 = 2;
pub const DEFAULT_MAX_GROUP_SIZE: usize = 10; // Telegram media-group limit

/// Configuration for the media collector
#[derive(Debug, Clone)]
pub struct AlbumConfig {
    /// Inactivity window after which a chat's pending batch is finalized
    pub quiet_period: Duration,
    /// Maximum number of items per emitted album
    pub max_group_size: usize,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_secs(DEFAULT_QUIET_PERIOD_SECS),
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
        }
    }
}

impl AlbumConfig {
    /// Build a configuration from environment overrides.
    ///
    /// `ALBUM_QUIET_SECS` and `ALBUM_MAX_GROUP_SIZE` are optional; anything
    /// missing or unparsable falls back to the defaults. The group size is
    /// clamped to at least 1.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let quiet_period = std::env::var("ALBUM_QUIET_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.quiet_period);

        let max_group_size = std::env::var("ALBUM_MAX_GROUP_SIZE")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(defaults.max_group_size)
            .max(1);

        Self {
            quiet_period,
            max_group_size,
        }
    }
}
