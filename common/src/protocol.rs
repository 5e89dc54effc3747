//! Wire message definitions
//!
//! Every frame on every tally connection carries exactly one [`Message`].
//! Workers open with a [`Handshake`] and then answer [`SubtaskRequest`]s;
//! clients send one [`TaskRequest`] and read back either a
//! [`ClientResponse`] or an [`ErrorResponse`].

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};

/// Codes carried by [`ErrorResponse::code`].
pub mod error_codes {
    /// Fewer workers registered than the leader's quorum.
    pub const INSUFFICIENT_WORKERS: i32 = 1;
    /// Two or more partial results carried the same value.
    pub const CONSENSUS_FAILED: i32 = 3;
}

/// First frame a worker sends after connecting to the registration port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Handshake {
    pub worker_id: String,
}

/// A client's unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TaskRequest {
    pub values: Vec<i32>,
    /// Synthetic cost applied once per element, in milliseconds.
    pub delay_ms: i32,
}

/// One contiguous slice of a [`TaskRequest`], sent to a single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct SubtaskRequest {
    pub values: Vec<i32>,
    pub delay_ms: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct SubtaskResult {
    pub sum: i32,
    pub worker_id: String,
}

/// Successful answer to a [`TaskRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ClientResponse {
    pub sum: i32,
    pub baseline_ms: i32,
    pub distributed_ms: i32,
}

/// Structured failure returned to a client instead of a [`ClientResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
}

impl ErrorResponse {
    pub fn new<S: Into<String>>(code: i32, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Envelope for everything that crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub enum Message {
    Handshake(Handshake),
    TaskRequest(TaskRequest),
    SubtaskRequest(SubtaskRequest),
    SubtaskResult(SubtaskResult),
    ClientResponse(ClientResponse),
    ErrorResponse(ErrorResponse),
}

impl Message {
    /// Variant name, used in logs and protocol errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Handshake(_) => "Handshake",
            Message::TaskRequest(_) => "TaskRequest",
            Message::SubtaskRequest(_) => "SubtaskRequest",
            Message::SubtaskResult(_) => "SubtaskResult",
            Message::ClientResponse(_) => "ClientResponse",
            Message::ErrorResponse(_) => "ErrorResponse",
        }
    }

    /// Serialize into a frame body (without the length prefix).
    pub fn to_frame(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            ProtocolError::encode_error_with_source(format!("{} frame", self.kind()), e)
        })
    }

    /// Deserialize a frame body. The body must be consumed exactly.
    pub fn from_frame(body: &[u8]) -> Result<Self> {
        let (message, read): (Message, usize) =
            bincode::decode_from_slice(body, bincode::config::standard()).map_err(|e| {
                ProtocolError::decode_error_with_source(
                    format!("undecodable {}-byte frame", body.len()),
                    e,
                )
            })?;
        if read != body.len() {
            return Err(ProtocolError::decode_error(format!(
                "{} trailing bytes after {}",
                body.len() - read,
                message.kind()
            )));
        }
        Ok(message)
    }

    pub fn into_handshake(self) -> Result<Handshake> {
        match self {
            Message::Handshake(handshake) => Ok(handshake),
            other => Err(ProtocolError::unexpected("Handshake", other.kind())),
        }
    }

    pub fn into_task_request(self) -> Result<TaskRequest> {
        match self {
            Message::TaskRequest(request) => Ok(request),
            other => Err(ProtocolError::unexpected("TaskRequest", other.kind())),
        }
    }

    pub fn into_subtask_request(self) -> Result<SubtaskRequest> {
        match self {
            Message::SubtaskRequest(request) => Ok(request),
            other => Err(ProtocolError::unexpected("SubtaskRequest", other.kind())),
        }
    }

    pub fn into_subtask_result(self) -> Result<SubtaskResult> {
        match self {
            Message::SubtaskResult(result) => Ok(result),
            other => Err(ProtocolError::unexpected("SubtaskResult", other.kind())),
        }
    }
}

impl From<Handshake> for Message {
    fn from(value: Handshake) -> Self {
        Message::Handshake(value)
    }
}

impl From<TaskRequest> for Message {
    fn from(value: TaskRequest) -> Self {
        Message::TaskRequest(value)
    }
}

impl From<SubtaskRequest> for Message {
    fn from(value: SubtaskRequest) -> Self {
        Message::SubtaskRequest(value)
    }
}

impl From<SubtaskResult> for Message {
    fn from(value: SubtaskResult) -> Self {
        Message::SubtaskResult(value)
    }
}

impl From<ClientResponse> for Message {
    fn from(value: ClientResponse) -> Self {
        Message::ClientResponse(value)
    }
}

impl From<ErrorResponse> for Message {
    fn from(value: ErrorResponse) -> Self {
        Message::ErrorResponse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_preserves_order_and_sign() {
        let message = Message::from(TaskRequest {
            values: vec![5, -3, 0, i32::MAX, i32::MIN],
            delay_ms: 25,
        });

        let body = message.to_frame().unwrap();
        let decoded = Message::from_frame(&body).unwrap();

        assert_eq!(decoded, message);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut body = Message::from(Handshake {
            worker_id: "node-xyz".to_string(),
        })
        .to_frame()
        .unwrap();
        body.push(0);

        let err = Message::from_frame(&body).unwrap_err();
        assert!(matches!(err, ProtocolError::DecodeError { .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = Message::from_frame(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, ProtocolError::DecodeError { .. }));
    }

    #[test]
    fn test_into_accessors_check_variant() {
        let message = Message::from(SubtaskResult {
            sum: 42,
            worker_id: "node-xyz".to_string(),
        });
        assert!(message.clone().into_handshake().is_err());

        let result = message.into_subtask_result().unwrap();
        assert_eq!(result.sum, 42);
        assert_eq!(result.worker_id, "node-xyz");
    }
}
