//! # Album Error Types Module
//!
//! This module defines the error types used throughout the batching engine.
//! None of them are fatal to the dispatcher; callers decide which ones are
//! worth telling the user about.

/// Error types for batch collection and delivery
#[derive(Debug, Clone)]
pub enum AlbumError {
    /// No pending batch exists for the chat (done/clear with nothing
    /// pending, or a timer that fired after the batch was already gone)
    ChatNotFound,
    /// Media arrived while the chat's batch was being finalized; the
    /// arrival path consumes this and starts a fresh batch
    LateArrival,
    /// The transport rejected a grouped-send request
    SendFailure(String),
    /// The archival collaborator rejected a forwarded copy
    ArchiveFailure(String),
}

impl std::fmt::Display for AlbumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlbumError::ChatNotFound => write!(f, "no pending media batch for this chat"),
            AlbumError::LateArrival => write!(f, "media arrived while the batch was finalizing"),
            AlbumError::SendFailure(msg) => write!(f, "send failure: {msg}"),
            AlbumError::ArchiveFailure(msg) => write!(f, "archive failure: {msg}"),
        }
    }
}

impl std::error::Error for AlbumError {}
