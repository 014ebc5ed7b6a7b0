//! Wire protocol for the tool server
//!
//! Defines the request/response message types exchanged over the
//! line-delimited JSON transport.

pub mod messages;

pub use messages::{
    ErrorCode, ErrorDetails, ErrorMessage, ServerMessage, ToolCallRequest, ToolResultMessage,
};
