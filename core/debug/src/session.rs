//! Session lifecycle and the run/debug state machine.
//!
//! A [`SessionController`] owns at most one active session. `Idle` and
//! `Debugging` are not flags but structure: the controller holds
//! `Option<DebugSession>`, and a [`DebugSession`] can only be built with all
//! of its resources populated, so the all-or-nothing invariant is enforced by
//! the type system rather than checked at runtime.
//!
//! The host is expected to issue one operation at a time and wait for its
//! completion; the precondition checks here are the only guard, and they are
//! not safe against truly concurrent invocation. `run` and `resume` block
//! inside the engine until it pauses, terminates, or fails. There is no
//! timeout, so a script that loops forever with no breakpoints blocks the
//! controller for good.

use log::debug;

use crate::breakpoint::{self, BreakpointResult};
use crate::bridge::{EventBridge, TerminateSignal};
use crate::engine::{DebugHandle, EngineFactory, OutputBuffer, ScriptEngine};
use crate::notify::{HostNotification, HostNotifier};

/// Errors returned by session operations.
///
/// Engine-originated messages are carried verbatim; the state-machine
/// variants render as the exact phrases the host shows its user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `run` was called while a debugging session is active.
    #[error("can't run while debugging")]
    RunWhileDebugging,
    /// `start_debug` was called while a debugging session is active.
    #[error("already debugging")]
    AlreadyDebugging,
    /// A debugging operation was called with no active session.
    #[error("must start debugging first")]
    NotDebugging,
    /// The source failed to compile.
    #[error("{0}")]
    Compile(String),
    /// Evaluation failed during `run`.
    #[error("{0}")]
    Eval(String),
    /// The debugger reported an unrecoverable error while resuming.
    #[error("{0}")]
    Runtime(String),
}

/// The resources of one active debugging session.
///
/// Built in one piece by `start_debug` and dropped in one piece on reset or
/// termination, so the session is never partially populated.
pub struct DebugSession<E: ScriptEngine> {
    /// The interpreter instance this session runs in.
    pub engine: E,
    /// The compiled program being debugged.
    pub program: E::Program,
    /// Breakpoint resolution scope covering the whole program.
    pub target: E::Target,
    /// Debugger bound to the program, with the event bridge installed.
    pub debugger: E::Debugger,
    /// Captured program stdout.
    pub stdout: OutputBuffer,
    /// Captured program stderr.
    pub stderr: OutputBuffer,
    /// Set by the bridge once a terminate event has been observed.
    pub terminated: TerminateSignal,
}

impl<E: ScriptEngine> std::fmt::Debug for DebugSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSession")
            .field("terminated", &self.terminated.is_set())
            .finish_non_exhaustive()
    }
}

/// Drives the embedded engine on behalf of the host.
pub struct SessionController<F: EngineFactory> {
    factory: F,
    notifier: HostNotifier,
    session: Option<DebugSession<F::Engine>>,
}

impl<F: EngineFactory> std::fmt::Debug for SessionController<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("debugging", &self.is_debugging())
            .finish_non_exhaustive()
    }
}

impl<F: EngineFactory> SessionController<F> {
    /// Creates an idle controller.
    pub fn new(factory: F, notifier: HostNotifier) -> Self {
        Self {
            factory,
            notifier,
            session: None,
        }
    }

    /// Whether a debugging session is active.
    pub fn is_debugging(&self) -> bool {
        self.session.is_some()
    }

    /// Evaluates `source` to completion and returns its captured stdout.
    ///
    /// Runs on a fresh interpreter with fresh buffers; nothing survives into
    /// the next operation, and a session-reset notification goes out on
    /// every return path so the host can unconditionally re-enable its
    /// controls.
    pub fn run(&mut self, source: &str) -> Result<String, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::RunWhileDebugging);
        }

        let stdout = OutputBuffer::new();
        let stderr = OutputBuffer::new();
        let mut engine = self.factory.spawn(stdout.clone(), stderr.clone());
        let outcome = engine.eval(source);
        self.notifier.send(HostNotification::SessionReset);
        match outcome {
            Ok(()) => {
                debug!("ran code");
                Ok(stdout.contents())
            }
            Err(err) => Err(SessionError::Eval(err.to_string())),
        }
    }

    /// Compiles `source`, installs the initial breakpoint set, and runs to
    /// the first pause, termination, or error.
    ///
    /// Returns the stdout captured up to the moment execution first stops.
    /// On a compile or resume failure the controller is left idle.
    pub fn start_debug(&mut self, source: &str, lines: &[i64]) -> Result<String, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyDebugging);
        }

        let stdout = OutputBuffer::new();
        let stderr = OutputBuffer::new();
        let mut engine = self.factory.spawn(stdout.clone(), stderr.clone());
        let program = match engine.compile(source) {
            Ok(program) => program,
            Err(err) => {
                self.notifier.send(HostNotification::SessionReset);
                return Err(SessionError::Compile(err.to_string()));
            }
        };

        let terminated = TerminateSignal::new();
        let mut bridge = EventBridge::new(stdout.clone(), self.notifier.clone(), terminated.clone());
        let mut debugger = engine.debug(&program, Box::new(move |event| bridge.handle(event)));
        let target = engine.program_target(&program);

        let results = breakpoint::install(&mut debugger, &target, lines);
        self.notifier.send(HostNotification::Breakpoints(results));

        let mut session = DebugSession {
            engine,
            program,
            target,
            debugger,
            stdout,
            stderr,
            terminated,
        };
        debug!("started debugging");

        match session.debugger.resume() {
            Ok(()) => {
                let output = session.stdout.contents();
                if !session.terminated.is_set() {
                    self.session = Some(session);
                }
                Ok(output)
            }
            Err(err) => {
                self.notifier.send(HostNotification::SessionReset);
                Err(SessionError::Runtime(err.to_string()))
            }
        }
    }

    /// Replaces the installed breakpoint set of the active session.
    ///
    /// Returns one result per requested line, in request order, and pushes
    /// the same data to the host for its gutter display.
    pub fn set_breakpoints(&mut self, lines: &[i64]) -> Result<Vec<BreakpointResult>, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotDebugging)?;
        let results = breakpoint::install(&mut session.debugger, &session.target, lines);
        self.notifier
            .send(HostNotification::Breakpoints(results.clone()));
        debug!("set {} breakpoints", results.len());
        Ok(results)
    }

    /// Resumes the paused session and blocks until the next pause,
    /// termination, or error, then returns the stdout captured so far.
    ///
    /// If the bridge observed a terminate event during the resume, the
    /// session is gone by the time this returns; the host was already
    /// notified through the bridge.
    pub fn resume(&mut self) -> Result<String, SessionError> {
        let mut session = self.session.take().ok_or(SessionError::NotDebugging)?;
        match session.debugger.resume() {
            Ok(()) => {
                let output = session.stdout.contents();
                if !session.terminated.is_set() {
                    self.session = Some(session);
                }
                debug!("continued debugging");
                Ok(output)
            }
            Err(err) => {
                self.notifier.send(HostNotification::SessionReset);
                Err(SessionError::Runtime(err.to_string()))
            }
        }
    }

    /// Tears down any active session and notifies the host. Idempotent.
    pub fn reset(&mut self) {
        self.session = None;
        self.notifier.send(HostNotification::SessionReset);
    }
}
