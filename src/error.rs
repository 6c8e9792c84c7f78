//! Error types for the capture engine.
//!
//! This module defines all error types that can occur while revealing,
//! converting and assembling a virtualized document.

use crate::converters::BlockKind;

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during a capture.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A capture was requested while another one is still running.
    #[error("Capture already in progress")]
    CaptureInProgress,

    /// The targeted document changed while a session was running.
    #[error("Document changed during capture: {from} -> {to}")]
    DocumentChanged {
        /// Identity the session was started against
        from: String,
        /// Identity observed when the session finished
        to: String,
    },

    /// The assembler found the session in an inconsistent state (fatal).
    #[error("Assembly failed: {0}")]
    Assembly(String),

    /// A single block could not be converted (non-fatal, the block is dropped)
    #[error("Failed to convert {kind} block: {reason}")]
    Conversion {
        /// Kind the block was classified as
        kind: BlockKind,
        /// Reason for the conversion failure
        reason: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed document snapshot
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error aborts a session.
    ///
    /// Conversion failures only ever drop the affected block.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Conversion { .. })
    }
}
