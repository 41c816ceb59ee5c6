//! Krait's debug session controller.
//!
//! This crate sits between an embedded scripting interpreter and an external
//! host such as an editor UI: the host asks to run or debug source text, and
//! the controller owns everything in between: session lifecycle, breakpoint
//! registration, paused-state inspection, and per-run output capture.
//!
//! # Architecture
//!
//! - [`engine`]: the interpreter boundary. The engine is a black box behind
//!   the [`ScriptEngine`] trait family; the controller never inspects it.
//! - [`session`]: the `Idle`/`Debugging` state machine. At most one session
//!   exists, and a live session owns its program, debugger, breakpoint
//!   target, and output buffers together.
//! - [`breakpoint`]: translates host line numbers into debugger requests and
//!   zips the outcomes back onto the input order.
//! - [`value`] and [`format`]: a closed runtime-value model and the pure
//!   recursive renderer producing the host's variable display strings.
//! - [`bridge`]: the debugger's event callback; snapshots frames and output
//!   and pushes typed [`notify`] notifications to the host.
//! - [`protocol`]: the framed JSON wire protocol and a blocking dispatch
//!   server generic over its transport.
//!
//! # Example
//!
//! ```rust,ignore
//! use krait_debug::{AdapterServer, StdioTransport};
//!
//! // Serve host requests over stdio until the host disconnects.
//! let mut server = AdapterServer::new(MyEngineFactory::default());
//! let mut transport = StdioTransport::new();
//! server.serve(&mut transport)?;
//! ```

pub mod breakpoint;
pub mod bridge;
pub mod engine;
pub mod format;
pub mod notify;
pub mod protocol;
pub mod session;
pub mod value;

pub use breakpoint::{BreakpointRequest, BreakpointResult, ResolvedBreakpoint};
pub use bridge::{EventBridge, TerminateSignal};
pub use engine::{
    DEBUG_BREAK, DEBUG_TERMINATE, DebugHandle, EngineError, EngineEvent, EngineFactory,
    EngineFrame, EngineResult, EngineScope, EngineVariable, EventCallback, OutputBuffer,
    ScriptEngine,
};
pub use format::format_value;
pub use notify::{DebugEvent, HostNotification, HostNotifier, StackFrame, Variable};
pub use protocol::{AdapterServer, StdioTransport, TcpTransport, Transport};
pub use session::{DebugSession, SessionController, SessionError};
pub use value::{RuntimeValue, ValueKind};
