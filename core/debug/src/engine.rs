//! The embedded script engine boundary.
//!
//! The controller never looks inside the interpreter. Everything it needs is
//! expressed by the trait family in this module: an [`EngineFactory`] spawns a
//! fresh [`ScriptEngine`] per run with the session's output buffers attached,
//! the engine compiles and evaluates source text, and a [`DebugHandle`]
//! resumes execution and installs breakpoints against a whole-program target.
//!
//! Pause and terminate notifications flow the other way: the debugger invokes
//! the [`EventCallback`] it was given at creation time, synchronously, and
//! blocks on its return before execution proceeds.

use std::io;
use std::sync::{Arc, Mutex};

use crate::breakpoint::{BreakpointRequest, ResolvedBreakpoint};
use crate::value::RuntimeValue;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// An error reported by the embedded engine.
///
/// The message is surfaced to the host verbatim; the controller adds no
/// wrapping of its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    /// Creates an engine error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Reason code for a pause at a breakpoint.
pub const DEBUG_BREAK: i32 = 2;

/// Reason code for the end of the debugged program.
pub const DEBUG_TERMINATE: i32 = 7;

/// Callback invoked by the debugger on every pause/terminate notification.
///
/// The debugger blocks on the callback's return, so implementations must not
/// call back into the session controller.
pub type EventCallback = Box<dyn FnMut(&EngineEvent)>;

/// A single notification from the debugger.
///
/// `reason` is an opaque code owned by the engine; the controller only
/// interprets [`DEBUG_BREAK`] and [`DEBUG_TERMINATE`] and passes everything
/// else through to the host. `frames` is populated for pause notifications
/// and empty otherwise.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    /// Engine-defined reason code.
    pub reason: i32,
    /// Call stack at the pause point, innermost frame first.
    pub frames: Vec<EngineFrame>,
}

/// One active call frame as reported by the engine.
#[derive(Debug, Clone)]
pub struct EngineFrame {
    /// Function or script name.
    pub name: String,
    /// Source position of the paused statement, engine-formatted.
    pub position: String,
    /// Variable scopes, innermost first. Only the first scope is shown to
    /// the host.
    pub scopes: Vec<EngineScope>,
}

/// One variable scope of a frame.
#[derive(Debug, Clone, Default)]
pub struct EngineScope {
    /// Variables in the engine's declaration order.
    pub variables: Vec<EngineVariable>,
}

/// A named runtime value visible in a scope.
#[derive(Debug, Clone)]
pub struct EngineVariable {
    /// Variable name.
    pub name: String,
    /// Snapshot of the value.
    pub value: RuntimeValue,
}

/// Spawns fresh engine instances.
///
/// Each `run`/`start_debug` operation gets its own interpreter with its own
/// output buffers; nothing carries over between runs.
pub trait EngineFactory {
    /// The engine type this factory produces.
    type Engine: ScriptEngine;

    /// Creates a fresh engine writing program output to the given buffers.
    fn spawn(&self, stdout: OutputBuffer, stderr: OutputBuffer) -> Self::Engine;
}

/// The embedded interpreter, reduced to the operations the controller needs.
///
/// Value snapshots handed out through [`EngineEvent`]s are owned trees; an
/// engine materializing a self-referential runtime structure must bound the
/// tree on its side before reporting it.
pub trait ScriptEngine {
    /// Compiled form of a script, opaque to the controller.
    type Program;
    /// Breakpoint resolution scope, opaque to the controller.
    type Target;
    /// Debugger bound to a compiled program.
    type Debugger: DebugHandle<Target = Self::Target>;

    /// Evaluates `source` to completion, writing output to the buffers given
    /// at spawn time.
    fn eval(&mut self, source: &str) -> EngineResult<()>;

    /// Compiles `source` without running it.
    fn compile(&mut self, source: &str) -> EngineResult<Self::Program>;

    /// Creates a debugger for a compiled program with the event callback
    /// installed. Execution does not start until the first
    /// [`DebugHandle::resume`].
    fn debug(&mut self, program: &Self::Program, events: EventCallback) -> Self::Debugger;

    /// Returns the breakpoint target covering the whole program.
    fn program_target(&self, program: &Self::Program) -> Self::Target;
}

/// Debugger operations on a live session.
pub trait DebugHandle {
    /// Breakpoint resolution scope, matching the owning engine's.
    type Target;

    /// Installs `requests` against `target`, fully replacing any previously
    /// installed set. Returns one outcome per request, in request order.
    fn set_breakpoints(
        &mut self,
        target: &Self::Target,
        requests: &[BreakpointRequest],
    ) -> Vec<ResolvedBreakpoint>;

    /// Resumes execution and blocks until the next pause, termination, or
    /// unrecoverable error. Notifications are delivered through the
    /// [`EventCallback`] before this returns.
    fn resume(&mut self) -> EngineResult<()>;
}

/// Shared text buffer capturing a session's stdout or stderr.
///
/// Clones share the same storage, so the controller can keep reading what the
/// engine has written so far while execution is paused.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<String>>,
}

impl OutputBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything written so far.
    pub fn contents(&self) -> String {
        self.inner.lock().unwrap().clone()
    }

    /// Appends text to the buffer.
    pub fn push_str(&self, text: &str) {
        self.inner.lock().unwrap().push_str(text);
    }
}

impl io::Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap()
            .push_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
