//! Breakpoint registration.
//!
//! The host speaks in line numbers; the debugger answers with resolved
//! positions and validity. [`install`] submits one whole batch per
//! registration and zips the debugger's outcomes back onto the input, so the
//! host gets exactly one result per requested line, in the order it asked.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::engine::DebugHandle;

/// A line-based breakpoint request against the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointRequest {
    /// 1-based source line.
    pub line: i64,
}

impl BreakpointRequest {
    /// Creates a request for the given source line.
    pub fn at_line(line: i64) -> Self {
        Self { line }
    }
}

/// The debugger's outcome for one request: where the breakpoint actually
/// landed (the nearest executable statement), or invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBreakpoint {
    /// Engine-formatted position of the resolved statement; empty when
    /// invalid.
    pub position: String,
    /// Whether the request could be resolved at all.
    pub valid: bool,
}

/// One installed breakpoint as reported back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResult {
    /// The line the host asked for, unchanged.
    pub line_number: i64,
    /// Where the debugger placed it; empty when invalid.
    pub position: String,
    /// Whether the breakpoint is live.
    pub valid: bool,
}

/// Installs `lines` as the complete breakpoint set for `target`.
///
/// The batch fully supersedes whatever was installed before, including when
/// `lines` is empty. Duplicates and unsorted input are passed through as
/// given; the returned vector always has the same length and order as
/// `lines`.
pub fn install<D: DebugHandle>(
    debugger: &mut D,
    target: &D::Target,
    lines: &[i64],
) -> Vec<BreakpointResult> {
    let requests: Vec<BreakpointRequest> = lines
        .iter()
        .map(|&line| BreakpointRequest::at_line(line))
        .collect();
    for (index, request) in requests.iter().enumerate() {
        trace!("breakpoint {index} on line {}", request.line);
    }

    let outcomes = debugger.set_breakpoints(target, &requests);
    debug_assert_eq!(
        outcomes.len(),
        requests.len(),
        "debugger must answer every breakpoint request"
    );

    lines
        .iter()
        .zip(outcomes)
        .map(|(&line_number, outcome)| {
            if outcome.valid {
                debug!("valid breakpoint on line {line_number} set at {}", outcome.position);
            } else {
                debug!("invalid breakpoint on line {line_number}");
            }
            BreakpointResult {
                line_number,
                position: outcome.position,
                valid: outcome.valid,
            }
        })
        .collect()
}
