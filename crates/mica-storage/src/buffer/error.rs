//! Buffer pool errors.

use thiserror::Error;

use crate::disk::DiskError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum BufferError {
    /// Every frame is pinned; nothing can be evicted.
    #[error("buffer pool exhausted, all frames are pinned")]
    PoolExhausted,

    /// The replacer has no record for the frame.
    #[error("frame {frame_id} is not tracked by the replacer")]
    FrameNotTracked { frame_id: usize },

    /// The frame is tracked but marked non-evictable.
    #[error("frame {frame_id} is not evictable")]
    FrameNotEvictable { frame_id: usize },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Page I/O failed.
    #[error(transparent)]
    Disk(#[from] DiskError),
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a transient error that can be retried
    /// after clients release pins.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}
