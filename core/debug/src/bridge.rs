//! The event bridge between debugger and host.
//!
//! One [`EventBridge`] is installed per debugging session as the debugger's
//! event callback. The debugger invokes it synchronously and blocks on its
//! return, so the bridge only snapshots state and pushes notifications; it
//! never calls back into the session controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::trace;

use crate::engine::{DEBUG_BREAK, DEBUG_TERMINATE, EngineEvent, EngineFrame, OutputBuffer};
use crate::format::format_value;
use crate::notify::{DebugEvent, HostNotification, HostNotifier, StackFrame, Variable};

/// Flag shared between the bridge and the controller.
///
/// The bridge sets it when it observes a terminate event; the controller
/// checks it after a blocking resume returns and drops the session.
#[derive(Debug, Clone, Default)]
pub struct TerminateSignal(Arc<AtomicBool>);

impl TerminateSignal {
    /// Creates an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the session as terminated.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a terminate event has been observed.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Receives debugger events and forwards them to the host.
#[derive(Debug)]
pub struct EventBridge {
    stdout: OutputBuffer,
    notifier: HostNotifier,
    terminated: TerminateSignal,
}

impl EventBridge {
    /// Creates a bridge over the session's stdout buffer and notifier.
    pub fn new(stdout: OutputBuffer, notifier: HostNotifier, terminated: TerminateSignal) -> Self {
        Self {
            stdout,
            notifier,
            terminated,
        }
    }

    /// Handles one debugger notification.
    ///
    /// On a pause the call stack is snapshotted and formatted; on a terminate
    /// the session-reset notification goes out first, so the host observes an
    /// idle session by the time it processes the terminate event. All other
    /// reason codes pass through with absent frames.
    pub fn handle(&mut self, event: &EngineEvent) {
        trace!("debug event, reason {}", event.reason);
        let output = self.stdout.contents();
        let frames = (event.reason == DEBUG_BREAK).then(|| snapshot_frames(&event.frames));

        if event.reason == DEBUG_TERMINATE {
            self.terminated.set();
            self.notifier.send(HostNotification::SessionReset);
        }

        self.notifier.send(HostNotification::Debug(DebugEvent {
            reason: event.reason,
            output,
            frames,
        }));
    }
}

/// Formats every frame's first variable scope for the host.
fn snapshot_frames(frames: &[EngineFrame]) -> Vec<StackFrame> {
    frames
        .iter()
        .map(|frame| {
            let variables = frame
                .scopes
                .first()
                .map(|scope| {
                    scope
                        .variables
                        .iter()
                        .map(|variable| {
                            let (value, type_) = format_value(&variable.value);
                            Variable {
                                name: variable.name.clone(),
                                value,
                                type_,
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            StackFrame {
                name: frame.name.clone(),
                position: frame.position.clone(),
                variables,
            }
        })
        .collect()
}
