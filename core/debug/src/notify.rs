//! Host notifications.
//!
//! The controller pushes state changes to the host as a typed event sum over
//! an mpsc channel: breakpoint-gutter updates, debug events from the bridge,
//! and session resets. The host owns the receiving half and drains it at its
//! own pace; a host that has gone away simply stops receiving.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::breakpoint::BreakpointResult;

/// One formatted variable in a paused frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Variable name.
    pub name: String,
    /// Display string, compound values pre-flattened.
    pub value: String,
    /// Engine-reported type name.
    pub type_: String,
}

/// A snapshot of one active call at a pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Function or script name.
    pub name: String,
    /// Source position of the paused statement.
    pub position: String,
    /// Variables of the frame's first scope, in scope order.
    pub variables: Vec<Variable>,
}

/// A debugger notification as delivered to the host.
///
/// `frames` is `Some` exactly when `reason` denotes a pause; for every other
/// reason the field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent {
    /// Engine-defined reason code, forwarded untouched.
    pub reason: i32,
    /// Everything the program has written to stdout since the session
    /// started.
    pub output: String,
    /// Call stack at the pause, index 0 the innermost frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<StackFrame>>,
}

/// The push events a host can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    /// The installed breakpoint set changed; carries the full resolved set.
    Breakpoints(Vec<BreakpointResult>),
    /// The debugger paused, terminated, or reported another event.
    Debug(DebugEvent),
    /// The session was torn down; the host should return to its idle state.
    SessionReset,
}

/// Sending half of the notification channel.
///
/// Sends never block; if the receiving half is gone the notification is
/// dropped.
#[derive(Debug, Clone)]
pub struct HostNotifier {
    tx: mpsc::Sender<HostNotification>,
}

impl HostNotifier {
    /// Creates a connected notifier/receiver pair.
    pub fn channel() -> (Self, mpsc::Receiver<HostNotification>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Pushes a notification to the host.
    pub fn send(&self, notification: HostNotification) {
        let _ = self.tx.send(notification);
    }
}
