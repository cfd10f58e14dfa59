//! Unified error handling for the runtime.

use watchface_core::NodeId;

/// Failures of the paired-device transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("no route to node {0}")]
    NoRoute(NodeId),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("transport closed")]
    Closed,
}

/// Failures of the settings store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Runtime error type.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] watchface_core::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("bitmap buffer does not match {width}x{height}")]
    InvalidBitmap { width: u32, height: u32 },

    #[error("{0} timed out")]
    Timeout(&'static str),

    /// The owning scope was cancelled. Never turned into a state change.
    #[error("cancelled")]
    Cancelled,
}

impl RuntimeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RuntimeError::Cancelled)
    }
}

/// Result type alias for the runtime.
pub type Result<T> = std::result::Result<T, RuntimeError>;
