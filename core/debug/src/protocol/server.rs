//! Request dispatch for the host protocol.
//!
//! [`AdapterServer`] owns the session controller and the receiving half of
//! its notification channel. It decodes framed requests, invokes the matching
//! controller operation, and answers with any notifications raised during the
//! operation (in the order they were raised) followed by the response.

use std::io;
use std::sync::mpsc;

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use super::messages::*;
use super::transport::Transport;
use super::{Event, ProtocolMessage, Request, Response};
use crate::engine::EngineFactory;
use crate::notify::{HostNotification, HostNotifier};
use crate::session::SessionController;

/// Serves one host connection over a [`Transport`].
pub struct AdapterServer<F: EngineFactory> {
    controller: SessionController<F>,
    notifications: mpsc::Receiver<HostNotification>,
    seq: i64,
}

impl<F: EngineFactory> std::fmt::Debug for AdapterServer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterServer")
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl<F: EngineFactory> AdapterServer<F> {
    /// Creates a server around a fresh controller for `factory`.
    pub fn new(factory: F) -> Self {
        let (notifier, notifications) = HostNotifier::channel();
        Self {
            controller: SessionController::new(factory, notifier),
            notifications,
            seq: 1,
        }
    }

    /// Reads and handles requests until the host disconnects.
    pub fn serve<T: Transport>(&mut self, transport: &mut T) -> io::Result<()> {
        loop {
            let raw = match transport.read_message() {
                Ok(raw) => raw,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(err) => return Err(err),
            };

            let message: ProtocolMessage = match serde_json::from_str(&raw) {
                Ok(message) => message,
                Err(err) => {
                    warn!("dropping undecodable message: {err}");
                    continue;
                }
            };

            if let ProtocolMessage::Request(request) = message {
                for outgoing in self.handle_request(request) {
                    let json = serde_json::to_string(&outgoing)
                        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                    transport.write_message(&json)?;
                }
            }
        }
    }

    /// Handles one request and returns the messages to send, events first.
    pub fn handle_request(&mut self, request: Request) -> Vec<ProtocolMessage> {
        debug!("request {}: {}", request.seq, request.command);
        let body = match request.command.as_str() {
            "run" => self.handle_run(request.arguments),
            "startDebug" => self.handle_start_debug(request.arguments),
            "setBreakpoints" => self.handle_set_breakpoints(request.arguments),
            "continue" => self.handle_continue(),
            _ => {
                return vec![self.response(
                    request.seq,
                    &request.command,
                    false,
                    Some(format!("unknown command: {}", request.command)),
                    None,
                )];
            }
        };

        // Notifications raised during the operation precede its response, the
        // order a host wired to live callbacks would have observed.
        let mut messages = self.drain_events();
        messages.push(self.response(request.seq, &request.command, true, None, Some(body)));
        messages
    }

    fn handle_run(&mut self, arguments: Option<Value>) -> Value {
        let body = match decode_run(arguments) {
            Err(error) => RunResponseBody {
                error,
                output: String::new(),
            },
            Ok(args) => match self.controller.run(&args.code) {
                Ok(output) => RunResponseBody {
                    error: String::new(),
                    output,
                },
                Err(err) => RunResponseBody {
                    error: err.to_string(),
                    output: String::new(),
                },
            },
        };
        json_body(&body)
    }

    fn handle_start_debug(&mut self, arguments: Option<Value>) -> Value {
        let body = match decode_start_debug(arguments) {
            Err(error) => StartDebugResponseBody {
                error,
                output: String::new(),
            },
            Ok(args) => match self
                .controller
                .start_debug(&args.code, &args.breakpoint_lines)
            {
                Ok(output) => StartDebugResponseBody {
                    error: String::new(),
                    output,
                },
                Err(err) => StartDebugResponseBody {
                    error: err.to_string(),
                    output: String::new(),
                },
            },
        };
        json_body(&body)
    }

    fn handle_set_breakpoints(&mut self, arguments: Option<Value>) -> Value {
        let error = match decode_set_breakpoints(arguments) {
            Err(error) => error,
            Ok(args) => match self.controller.set_breakpoints(&args.breakpoint_lines) {
                Ok(_) => String::new(),
                Err(err) => err.to_string(),
            },
        };
        json_body(&SetBreakpointsResponseBody { error })
    }

    fn handle_continue(&mut self) -> Value {
        let error = match self.controller.resume() {
            Ok(_) => String::new(),
            Err(err) => err.to_string(),
        };
        json_body(&ContinueResponseBody { error })
    }

    fn drain_events(&mut self) -> Vec<ProtocolMessage> {
        let mut events = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            let event = match notification {
                HostNotification::Breakpoints(breakpoints) => self.event(
                    "breakpoints",
                    Some(json_body(&BreakpointsEventBody { breakpoints })),
                ),
                HostNotification::Debug(body) => self.event("debug", Some(json_body(&body))),
                HostNotification::SessionReset => self.event("reset", None),
            };
            events.push(event);
        }
        events
    }

    fn next_seq(&mut self) -> i64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn response(
        &mut self,
        request_seq: i64,
        command: &str,
        success: bool,
        message: Option<String>,
        body: Option<Value>,
    ) -> ProtocolMessage {
        ProtocolMessage::Response(Response {
            seq: self.next_seq(),
            request_seq,
            success,
            command: command.to_owned(),
            message,
            body,
        })
    }

    fn event(&mut self, event: &str, body: Option<Value>) -> ProtocolMessage {
        ProtocolMessage::Event(Event {
            seq: self.next_seq(),
            event: event.to_owned(),
            body,
        })
    }
}

/// Serialization of these plain data bodies cannot fail.
fn json_body<T: Serialize>(body: &T) -> Value {
    serde_json::to_value(body).unwrap_or(Value::Null)
}

fn decode_run(arguments: Option<Value>) -> Result<RunArguments, String> {
    let value = arguments.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|_| "no code provided".to_owned())
}

fn decode_start_debug(arguments: Option<Value>) -> Result<StartDebugArguments, String> {
    let value = arguments.unwrap_or(Value::Null);
    match serde_json::from_value(value.clone()) {
        Ok(args) => Ok(args),
        Err(_) => {
            if value.get("code").and_then(Value::as_str).is_none() {
                Err("must provide code and breakpointLines".to_owned())
            } else {
                Err("breakpointLines must be an array of line numbers".to_owned())
            }
        }
    }
}

fn decode_set_breakpoints(arguments: Option<Value>) -> Result<SetBreakpointsArguments, String> {
    let value = arguments.unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|_| "breakpointLines must be an array of line numbers".to_owned())
}
