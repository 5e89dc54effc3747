//! Common wire-level building blocks for the tally project.
//!
//! This crate provides the message set, the length-prefixed codec that carries
//! it over TCP, and the protocol error type shared by the leader, its workers
//! and its clients.

pub mod codec;
pub mod error;
pub mod protocol;
pub mod time;

pub use codec::{Connection, DEFAULT_MAX_FRAME_LENGTH, MessageCodec};
pub use error::{ProtocolError, Result};
pub use protocol::{
    ClientResponse, ErrorResponse, Handshake, Message, SubtaskRequest, SubtaskResult, TaskRequest,
    error_codes,
};
pub use time::{Stopwatch, duration_to_millis_i32, millis_i32_to_duration};
