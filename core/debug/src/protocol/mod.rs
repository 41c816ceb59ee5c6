//! Wire protocol between the controller and its host.
//!
//! The host drives the controller with JSON requests and receives responses
//! plus pushed events, each message framed with a `Content-Length` header.
//!
//! Commands: `run`, `startDebug`, `setBreakpoints`, `continue`. Session and
//! usage errors travel as data in the response body's `error` field (empty
//! on success); only an unknown command fails at the envelope level. Pushed
//! events: `breakpoints`, `debug`, `reset`.

pub mod messages;
pub mod server;
pub mod transport;

pub use messages::*;
pub use server::AdapterServer;
pub use transport::{StdioTransport, TcpTransport, Transport};

use serde::{Deserialize, Serialize};

/// Any message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolMessage {
    /// Host-initiated operation.
    #[serde(rename = "request")]
    Request(Request),
    /// Answer to a request.
    #[serde(rename = "response")]
    Response(Response),
    /// Controller-initiated push event.
    #[serde(rename = "event")]
    Event(Event),
}

/// A host request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Host-assigned sequence number.
    pub seq: i64,
    /// Command name.
    pub command: String,
    /// Command arguments, shape depending on the command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

/// A response to a host request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Controller-assigned sequence number.
    pub seq: i64,
    /// Sequence number of the request being answered.
    pub request_seq: i64,
    /// Whether the command was recognized and its arguments decoded; session
    /// errors are reported inside `body` instead.
    pub success: bool,
    /// Echo of the request command.
    pub command: String,
    /// Envelope-level error description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Command-specific response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// A pushed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Controller-assigned sequence number.
    pub seq: i64,
    /// Event name.
    pub event: String,
    /// Event-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}
