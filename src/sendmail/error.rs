//! Error types for mogisend

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendmailError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    AddressResolution(String),

    #[error("reading message header: {0}")]
    HeaderParse(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Size limits applied while reading a message
pub struct MessageLimits;

impl MessageLimits {
    /// Maximum total size of the header block, including line endings
    pub const HEADER_BLOCK_MAX_SIZE: usize = 1024 * 1024; // 1MB

    /// Buffer in front of the dot terminator filter, keeping every read it
    /// sees at or above `MIN_READ_LEN`
    pub const READ_CHUNK_SIZE: usize = 8 * 1024;
}

/// Maps errors to process exit codes
impl SendmailError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SendmailError::Usage(_) => 2,
            SendmailError::AddressResolution(_) => 1,
            SendmailError::HeaderParse(_) => 1,
            SendmailError::Delivery(_) => 1,
            SendmailError::Config(_) => 1,
            SendmailError::Io(_) => 1,
        }
    }

    /// Whether the error should be reported together with the usage text
    pub fn is_usage(&self) -> bool {
        matches!(self, SendmailError::Usage(_))
    }
}
