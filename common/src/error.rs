//! Error handling for the tally-common crate.

use thiserror::Error;

/// Wire-level failure on a framed connection.
///
/// Any of these means the byte stream can no longer be trusted. Callers treat
/// a `ProtocolError` as a lost connection: the peer is dropped and nothing is
/// retried on it.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Connection I/O failed: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode message: {message}")]
    EncodeError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Malformed frame: {message}")]
    DecodeError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Unexpected message: expected {expected}, got {actual}")]
    UnexpectedMessage {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type alias for wire operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// Create an encode error with a custom message and source error.
    pub fn encode_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::EncodeError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a decode error with a custom message.
    pub fn decode_error<S: Into<String>>(message: S) -> Self {
        Self::DecodeError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error with a custom message and source error.
    pub fn decode_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::DecodeError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an error for a well-formed message arriving in the wrong place.
    pub fn unexpected(expected: &'static str, actual: &'static str) -> Self {
        Self::UnexpectedMessage { expected, actual }
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(source: std::io::Error) -> Self {
        Self::IoError {
            message: source.to_string(),
            source,
        }
    }
}
