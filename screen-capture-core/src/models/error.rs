use thiserror::Error;

/// Errors that can occur during screen capture operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a capture session is already running")]
    AlreadyRunning,

    #[error("no capture session is running")]
    NotRunning,

    #[error("encoder configuration rejected: {0}")]
    EncoderConfig(String),

    #[error("encoder failed: {0}")]
    Encoder(String),

    #[error("catalog write failed: {0}")]
    CatalogWrite(String),

    #[error("scratch file unreadable: {0}")]
    ScratchRead(String),

    #[error("storage error: {0}")]
    Storage(String),
}
