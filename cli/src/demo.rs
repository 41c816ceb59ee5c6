//! A miniature deterministic engine for exercising the adapter.
//!
//! The binary has to speak for a real embedded interpreter, and the
//! integration tests need one with predictable behavior. This engine
//! interprets line-directive scripts:
//!
//! ```text
//! # comment
//! let total 40
//! print starting
//! let total 42
//! print done
//! ```
//!
//! `print` appends a line to the captured stdout, `let` binds an integer
//! local. Breakpoints resolve to directive-bearing lines; pausing reports a
//! single `main` frame whose first scope holds the current locals.

use std::rc::Rc;

use krait_debug::{
    BreakpointRequest, DEBUG_BREAK, DEBUG_TERMINATE, DebugHandle, EngineError, EngineEvent,
    EngineFactory, EngineFrame, EngineResult, EngineScope, EngineVariable, EventCallback,
    OutputBuffer, ResolvedBreakpoint, RuntimeValue, ScriptEngine,
};

#[derive(Debug, Clone)]
enum Directive {
    Print(String),
    Let { name: String, value: i64 },
}

#[derive(Debug, Clone)]
struct Statement {
    line: i64,
    directive: Directive,
}

/// A compiled demo script.
#[derive(Debug, Clone)]
pub struct DemoProgram {
    statements: Rc<Vec<Statement>>,
}

/// Breakpoint scope covering the whole script.
#[derive(Debug, Clone)]
pub struct DemoTarget {
    statements: Rc<Vec<Statement>>,
}

/// Spawns [`DemoEngine`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoFactory;

impl EngineFactory for DemoFactory {
    type Engine = DemoEngine;

    fn spawn(&self, stdout: OutputBuffer, stderr: OutputBuffer) -> DemoEngine {
        DemoEngine { stdout, stderr }
    }
}

/// The demo interpreter.
#[derive(Debug)]
pub struct DemoEngine {
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

impl DemoEngine {
    fn parse(&self, source: &str) -> EngineResult<Vec<Statement>> {
        let mut statements = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = index as i64 + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let (word, rest) = text.split_once(' ').unwrap_or((text, ""));
            let directive = match word {
                "print" => Directive::Print(rest.trim().to_owned()),
                "let" => {
                    let (name, value) = rest.trim().split_once(' ').ok_or_else(|| {
                        EngineError::new(format!("line {line}: let needs a name and a value"))
                    })?;
                    let value = value.trim().parse::<i64>().map_err(|_| {
                        EngineError::new(format!("line {line}: {:?} is not an integer", value.trim()))
                    })?;
                    Directive::Let {
                        name: name.to_owned(),
                        value,
                    }
                }
                other => {
                    return Err(EngineError::new(format!(
                        "line {line}: unknown directive {other:?}"
                    )));
                }
            };
            statements.push(Statement { line, directive });
        }
        Ok(statements)
    }
}

impl ScriptEngine for DemoEngine {
    type Program = DemoProgram;
    type Target = DemoTarget;
    type Debugger = DemoDebugger;

    fn eval(&mut self, source: &str) -> EngineResult<()> {
        let statements = match self.parse(source) {
            Ok(statements) => statements,
            Err(err) => {
                self.stderr.push_str(&err.to_string());
                return Err(err);
            }
        };
        let mut locals = Locals::default();
        for statement in &statements {
            execute(statement, &mut locals, &self.stdout);
        }
        Ok(())
    }

    fn compile(&mut self, source: &str) -> EngineResult<DemoProgram> {
        let statements = self.parse(source)?;
        Ok(DemoProgram {
            statements: Rc::new(statements),
        })
    }

    fn debug(&mut self, program: &DemoProgram, events: EventCallback) -> DemoDebugger {
        DemoDebugger {
            statements: program.statements.clone(),
            stdout: self.stdout.clone(),
            events,
            breakpoints: Vec::new(),
            locals: Locals::default(),
            next: 0,
            paused_at: None,
        }
    }

    fn program_target(&self, program: &DemoProgram) -> DemoTarget {
        DemoTarget {
            statements: program.statements.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Locals(Vec<(String, i64)>);

impl Locals {
    fn bind(&mut self, name: &str, value: i64) {
        match self.0.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name.to_owned(), value)),
        }
    }

    fn snapshot(&self) -> Vec<EngineVariable> {
        self.0
            .iter()
            .map(|(name, value)| EngineVariable {
                name: name.clone(),
                value: RuntimeValue::int(*value),
            })
            .collect()
    }
}

fn execute(statement: &Statement, locals: &mut Locals, stdout: &OutputBuffer) {
    match &statement.directive {
        Directive::Print(text) => {
            stdout.push_str(text);
            stdout.push_str("\n");
        }
        Directive::Let { name, value } => locals.bind(name, *value),
    }
}

fn position(line: i64) -> String {
    format!("script:{line}:1")
}

/// Debugger over a compiled demo script.
pub struct DemoDebugger {
    statements: Rc<Vec<Statement>>,
    stdout: OutputBuffer,
    events: EventCallback,
    /// Lines with a live breakpoint.
    breakpoints: Vec<i64>,
    locals: Locals,
    /// Index of the next statement to execute.
    next: usize,
    /// Statement index we are currently paused on, so resuming steps past it
    /// instead of re-triggering the same breakpoint.
    paused_at: Option<usize>,
}

impl std::fmt::Debug for DemoDebugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoDebugger")
            .field("next", &self.next)
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

impl DemoDebugger {
    fn pause(&mut self, index: usize) {
        self.paused_at = Some(index);
        let statement = &self.statements[index];
        let event = EngineEvent {
            reason: DEBUG_BREAK,
            frames: vec![EngineFrame {
                name: "main".to_owned(),
                position: position(statement.line),
                scopes: vec![EngineScope {
                    variables: self.locals.snapshot(),
                }],
            }],
        };
        (self.events)(&event);
    }

    fn terminate(&mut self) {
        self.next = self.statements.len();
        self.paused_at = None;
        (self.events)(&EngineEvent {
            reason: DEBUG_TERMINATE,
            frames: vec![],
        });
    }
}

impl DebugHandle for DemoDebugger {
    type Target = DemoTarget;

    fn set_breakpoints(
        &mut self,
        target: &DemoTarget,
        requests: &[BreakpointRequest],
    ) -> Vec<ResolvedBreakpoint> {
        self.breakpoints.clear();
        requests
            .iter()
            .map(|request| {
                let hit = target
                    .statements
                    .iter()
                    .find(|statement| statement.line == request.line);
                match hit {
                    Some(statement) => {
                        self.breakpoints.push(statement.line);
                        ResolvedBreakpoint {
                            position: position(statement.line),
                            valid: true,
                        }
                    }
                    None => ResolvedBreakpoint {
                        position: String::new(),
                        valid: false,
                    },
                }
            })
            .collect()
    }

    fn resume(&mut self) -> EngineResult<()> {
        loop {
            if self.next >= self.statements.len() {
                self.terminate();
                return Ok(());
            }
            let index = self.next;
            let line = self.statements[index].line;
            if self.paused_at != Some(index) && self.breakpoints.contains(&line) {
                self.pause(index);
                return Ok(());
            }
            self.paused_at = None;
            let statement = self.statements[index].clone();
            execute(&statement, &mut self.locals, &self.stdout);
            self.next += 1;
        }
    }
}
