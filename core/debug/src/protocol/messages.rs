//! Typed request arguments, response bodies, and event payloads.

use serde::{Deserialize, Serialize};

use crate::breakpoint::BreakpointResult;

// ============================================================================
// Request Arguments
// ============================================================================

/// Arguments of the `run` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunArguments {
    /// Source code to evaluate.
    pub code: String,
}

/// Arguments of the `startDebug` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDebugArguments {
    /// Source code to compile and debug.
    pub code: String,
    /// Initial breakpoint lines, possibly empty.
    pub breakpoint_lines: Vec<i64>,
}

/// Arguments of the `setBreakpoints` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsArguments {
    /// The complete new breakpoint set.
    pub breakpoint_lines: Vec<i64>,
}

// ============================================================================
// Response Bodies
// ============================================================================

/// Body of a `run` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponseBody {
    /// Error text, empty on success.
    pub error: String,
    /// Captured stdout of the completed run.
    pub output: String,
}

/// Body of a `startDebug` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDebugResponseBody {
    /// Error text, empty on success.
    pub error: String,
    /// Stdout captured up to the first stop.
    pub output: String,
}

/// Body of a `setBreakpoints` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsResponseBody {
    /// Error text, empty on success.
    pub error: String,
}

/// Body of a `continue` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueResponseBody {
    /// Error text, empty on success.
    pub error: String,
}

// ============================================================================
// Event Bodies
// ============================================================================

/// Body of the `breakpoints` gutter-update event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointsEventBody {
    /// The full resolved breakpoint set, in request order.
    pub breakpoints: Vec<BreakpointResult>,
}
