//! Buffer pool errors.

use std::io;

use thiserror::Error;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// No frame is free and no resident page is evictable.
    #[error("no available frame: all pages are pinned")]
    PoolExhausted,

    /// I/O error from the disk manager.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying error.
        #[from]
        source: io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the condition can clear without intervention
    /// (e.g. once some caller unpins a page).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(BufferError::PoolExhausted.is_retryable());
        assert!(!BufferError::config("bad pool size").is_retryable());
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "boom");
        let err: BufferError = io_err.into();
        assert!(matches!(err, BufferError::Io { .. }));
    }
}
