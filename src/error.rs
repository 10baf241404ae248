//! Error types for cmdwire
//!
//! Provides a unified error type for codecs, framing and the network layer.

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Unified error type for cmdwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// A request field is outside its allowed length. Raised before any
    /// bytes are produced.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// A response payload is too short or otherwise unreadable
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown command code: {0}")]
    UnknownCommand(u8),

    /// The peer answered with a non-OK status
    #[error("Server returned status {status}: {message}")]
    Server { status: u8, message: String },

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Invalid username or password")]
    InvalidCredentials,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WireError {
    /// Whether repeating the same call could succeed.
    ///
    /// Input and decoding errors are deterministic and never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WireError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            WireError::ConnectionClosed => true,
            _ => false,
        }
    }
}
