//! Error taxonomy for the tally cluster.
//!
//! Only two variants are ever shown to a client as a framed
//! [`ErrorResponse`]: too few workers and a failed consensus check. Every
//! other failure is reported by closing the connection.

use tally_common::{ErrorResponse, ProtocolError, error_codes};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O failed while {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {worker_id} unreachable: {reason}")]
    WorkerUnreachable { worker_id: String, reason: String },

    #[error("Not enough nodes: {available} registered, at least {required} required")]
    InsufficientWorkers { available: usize, required: usize },

    #[error("Consensus check failed: {distinct} distinct values among {total} partial results")]
    ConsensusFailed { distinct: usize, total: usize },

    #[error("Connection closed before a response arrived")]
    ConnectionClosed,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

/// Result type alias for cluster operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

impl ClusterError {
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn worker_unreachable<I: Into<String>, R: ToString>(worker_id: I, reason: R) -> Self {
        Self::WorkerUnreachable {
            worker_id: worker_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wire code for errors a client is told about, `None` otherwise.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            Self::InsufficientWorkers { .. } => Some(error_codes::INSUFFICIENT_WORKERS),
            Self::ConsensusFailed { .. } => Some(error_codes::CONSENSUS_FAILED),
            _ => None,
        }
    }

    /// The framed response for a client-visible error.
    pub fn to_error_response(&self) -> Option<ErrorResponse> {
        self.error_code()
            .map(|code| ErrorResponse::new(code, self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_visible_codes() {
        let quorum = ClusterError::InsufficientWorkers {
            available: 2,
            required: 3,
        };
        let response = quorum.to_error_response().unwrap();
        assert_eq!(response.code, 1);
        assert!(response.message.starts_with("Not enough nodes"));

        let consensus = ClusterError::ConsensusFailed {
            distinct: 2,
            total: 3,
        };
        assert_eq!(consensus.error_code(), Some(3));
    }

    #[test]
    fn test_transport_errors_have_no_code() {
        assert!(ClusterError::ConnectionClosed.to_error_response().is_none());
        assert!(
            ClusterError::worker_unreachable("node-1", "reset")
                .to_error_response()
                .is_none()
        );
        let protocol: ClusterError = ProtocolError::decode_error("bad frame").into();
        assert!(protocol.error_code().is_none());
    }
}
