//! Session state machine tests against a scripted engine.
//!
//! The fake engine plays back a plan: canned eval/compile outcomes and one
//! scripted step per resume. That keeps the controller's state machine, the
//! breakpoint bookkeeping, and the notification stream observable without a
//! real interpreter.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use krait_debug::{
    DEBUG_BREAK, DEBUG_TERMINATE, DebugHandle, EngineError, EngineEvent, EngineFactory,
    EngineFrame, EngineResult, EngineScope, EngineVariable, EventCallback, HostNotification,
    HostNotifier, OutputBuffer, ResolvedBreakpoint, RuntimeValue, ScriptEngine,
    SessionController, SessionError,
};

/// What one `resume` call does.
enum Step {
    /// Write some output, then pause with the given call stack.
    Break {
        prints: Vec<&'static str>,
        frames: Vec<EngineFrame>,
    },
    /// Write some output, then report termination.
    Terminate { prints: Vec<&'static str> },
    /// Fail without reporting any event.
    Fail(&'static str),
}

#[derive(Default)]
struct Plan {
    eval_output: &'static str,
    eval_error: Option<&'static str>,
    compile_error: Option<&'static str>,
    invalid_lines: Vec<i64>,
    steps: VecDeque<Step>,
    /// Every batch the debugger received, in submission order.
    installed: Vec<Vec<i64>>,
}

#[derive(Clone)]
struct FakeFactory {
    plan: Rc<RefCell<Plan>>,
}

impl FakeFactory {
    fn new(plan: Plan) -> Self {
        Self {
            plan: Rc::new(RefCell::new(plan)),
        }
    }
}

impl EngineFactory for FakeFactory {
    type Engine = FakeEngine;

    fn spawn(&self, stdout: OutputBuffer, stderr: OutputBuffer) -> FakeEngine {
        FakeEngine {
            plan: self.plan.clone(),
            stdout,
            stderr,
        }
    }
}

struct FakeEngine {
    plan: Rc<RefCell<Plan>>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

impl ScriptEngine for FakeEngine {
    type Program = ();
    type Target = ();
    type Debugger = FakeDebugger;

    fn eval(&mut self, _source: &str) -> EngineResult<()> {
        let plan = self.plan.borrow();
        if let Some(message) = plan.eval_error {
            self.stderr.push_str(message);
            return Err(EngineError::new(message));
        }
        self.stdout.push_str(plan.eval_output);
        Ok(())
    }

    fn compile(&mut self, _source: &str) -> EngineResult<()> {
        match self.plan.borrow().compile_error {
            Some(message) => Err(EngineError::new(message)),
            None => Ok(()),
        }
    }

    fn debug(&mut self, _program: &(), events: EventCallback) -> FakeDebugger {
        FakeDebugger {
            plan: self.plan.clone(),
            stdout: self.stdout.clone(),
            events,
        }
    }

    fn program_target(&self, _program: &()) {}
}

struct FakeDebugger {
    plan: Rc<RefCell<Plan>>,
    stdout: OutputBuffer,
    events: EventCallback,
}

impl DebugHandle for FakeDebugger {
    type Target = ();

    fn set_breakpoints(
        &mut self,
        _target: &(),
        requests: &[krait_debug::BreakpointRequest],
    ) -> Vec<ResolvedBreakpoint> {
        let mut plan = self.plan.borrow_mut();
        plan.installed
            .push(requests.iter().map(|request| request.line).collect());
        requests
            .iter()
            .map(|request| {
                if plan.invalid_lines.contains(&request.line) {
                    ResolvedBreakpoint {
                        position: String::new(),
                        valid: false,
                    }
                } else {
                    ResolvedBreakpoint {
                        position: format!("script:{}:1", request.line),
                        valid: true,
                    }
                }
            })
            .collect()
    }

    fn resume(&mut self) -> EngineResult<()> {
        let step = self
            .plan
            .borrow_mut()
            .steps
            .pop_front()
            .unwrap_or(Step::Terminate { prints: vec![] });
        match step {
            Step::Break { prints, frames } => {
                for text in prints {
                    self.stdout.push_str(text);
                }
                (self.events)(&EngineEvent {
                    reason: DEBUG_BREAK,
                    frames,
                });
                Ok(())
            }
            Step::Terminate { prints } => {
                for text in prints {
                    self.stdout.push_str(text);
                }
                (self.events)(&EngineEvent {
                    reason: DEBUG_TERMINATE,
                    frames: vec![],
                });
                Ok(())
            }
            Step::Fail(message) => Err(EngineError::new(message)),
        }
    }
}

fn frame_at(position: &str, x: i64) -> EngineFrame {
    EngineFrame {
        name: "main".to_owned(),
        position: position.to_owned(),
        scopes: vec![EngineScope {
            variables: vec![EngineVariable {
                name: "x".to_owned(),
                value: RuntimeValue::int(x),
            }],
        }],
    }
}

fn controller(plan: Plan) -> (SessionController<FakeFactory>, Receiver<HostNotification>) {
    let (notifier, rx) = HostNotifier::channel();
    (SessionController::new(FakeFactory::new(plan), notifier), rx)
}

fn drain(rx: &Receiver<HostNotification>) -> Vec<HostNotification> {
    rx.try_iter().collect()
}

#[test]
fn run_returns_captured_output_and_resets() {
    let (mut controller, rx) = controller(Plan {
        eval_output: "2\n",
        ..Plan::default()
    });

    assert_eq!(controller.run("print(2)").unwrap(), "2\n");
    assert!(!controller.is_debugging());
    assert_eq!(drain(&rx), vec![HostNotification::SessionReset]);
}

#[test]
fn run_does_not_accumulate_output_across_calls() {
    let (mut controller, _rx) = controller(Plan {
        eval_output: "a\n",
        ..Plan::default()
    });

    assert_eq!(controller.run("print(\"a\")").unwrap(), "a\n");
    assert_eq!(controller.run("print(\"a\")").unwrap(), "a\n");
}

#[test]
fn run_failure_surfaces_engine_text_verbatim() {
    let (mut controller, rx) = controller(Plan {
        eval_error: Some("1:1: undefined: nope"),
        ..Plan::default()
    });

    let err = controller.run("nope").unwrap_err();
    assert_eq!(err, SessionError::Eval("1:1: undefined: nope".to_owned()));
    assert_eq!(err.to_string(), "1:1: undefined: nope");
    assert!(!controller.is_debugging());
    assert_eq!(drain(&rx), vec![HostNotification::SessionReset]);
}

#[test]
fn run_while_debugging_is_rejected_without_touching_the_session() {
    let (mut controller, _rx) = controller(Plan {
        steps: VecDeque::from([
            Step::Break {
                prints: vec![],
                frames: vec![frame_at("script:1:1", 1)],
            },
            Step::Terminate { prints: vec![] },
        ]),
        ..Plan::default()
    });

    controller.start_debug("x := 1", &[1]).unwrap();
    assert!(controller.is_debugging());

    let err = controller.run("print(2)").unwrap_err();
    assert_eq!(err.to_string(), "can't run while debugging");
    assert!(controller.is_debugging(), "session must be untouched");

    // The scripted terminate step is still there for the paused session.
    controller.resume().unwrap();
    assert!(!controller.is_debugging());
}

#[test]
fn debug_operations_require_an_active_session() {
    let (mut controller, _rx) = controller(Plan::default());

    let err = controller.resume().unwrap_err();
    assert_eq!(err.to_string(), "must start debugging first");

    let err = controller.set_breakpoints(&[1]).unwrap_err();
    assert_eq!(err, SessionError::NotDebugging);
}

#[test]
fn start_debug_while_debugging_is_rejected() {
    let (mut controller, _rx) = controller(Plan {
        steps: VecDeque::from([Step::Break {
            prints: vec![],
            frames: vec![],
        }]),
        ..Plan::default()
    });

    controller.start_debug("x := 1", &[]).unwrap();
    let err = controller.start_debug("x := 2", &[]).unwrap_err();
    assert_eq!(err.to_string(), "already debugging");
}

#[test]
fn start_debug_without_breakpoints_runs_to_termination() {
    let (mut controller, rx) = controller(Plan {
        steps: VecDeque::from([Step::Terminate { prints: vec!["2"] }]),
        ..Plan::default()
    });

    let output = controller.start_debug("x := 1 + 1; print(x)", &[]).unwrap();
    assert_eq!(output, "2");
    assert!(!controller.is_debugging());

    let notifications = drain(&rx);
    assert_eq!(
        notifications[0],
        HostNotification::Breakpoints(vec![]),
        "the empty initial set is still announced"
    );
    assert_eq!(notifications[1], HostNotification::SessionReset);
    let HostNotification::Debug(event) = &notifications[2] else {
        panic!("expected the terminate debug event last");
    };
    assert_eq!(event.reason, DEBUG_TERMINATE);
    assert_eq!(event.output, "2");
    assert!(event.frames.is_none());
    assert!(
        !notifications
            .iter()
            .any(|n| matches!(n, HostNotification::Debug(e) if e.reason == DEBUG_BREAK)),
        "no pause may occur without breakpoints"
    );
}

#[test]
fn breakpoint_results_keep_input_order_length_and_duplicates() {
    let (mut controller, rx) = controller(Plan {
        invalid_lines: vec![3],
        steps: VecDeque::from([Step::Break {
            prints: vec![],
            frames: vec![],
        }]),
        ..Plan::default()
    });

    controller.start_debug("code", &[5, 3, 5, 2]).unwrap();

    let notifications = drain(&rx);
    let HostNotification::Breakpoints(results) = &notifications[0] else {
        panic!("expected a breakpoints notification");
    };
    let lines: Vec<i64> = results.iter().map(|r| r.line_number).collect();
    assert_eq!(lines, vec![5, 3, 5, 2]);
    let validity: Vec<bool> = results.iter().map(|r| r.valid).collect();
    assert_eq!(validity, vec![true, false, true, true]);
    assert_eq!(results[0].position, "script:5:1");
    assert_eq!(results[1].position, "");
}

#[test]
fn set_breakpoints_replaces_the_whole_set() {
    let factory_plan = Plan {
        steps: VecDeque::from([Step::Break {
            prints: vec![],
            frames: vec![],
        }]),
        ..Plan::default()
    };
    let (notifier, rx) = HostNotifier::channel();
    let factory = FakeFactory::new(factory_plan);
    let plan = factory.plan.clone();
    let mut controller = SessionController::new(factory, notifier);

    controller.start_debug("code", &[1, 2]).unwrap();
    let results = controller.set_breakpoints(&[7]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].line_number, 7);

    // Two full batches: the initial install and its replacement.
    assert_eq!(plan.borrow().installed, vec![vec![1, 2], vec![7]]);

    let notifications = drain(&rx);
    assert!(matches!(
        notifications.last(),
        Some(HostNotification::Breakpoints(set)) if set.len() == 1
    ));
}

#[test]
fn pause_fires_again_on_the_next_loop_iteration() {
    let (mut controller, rx) = controller(Plan {
        steps: VecDeque::from([
            Step::Break {
                prints: vec![],
                frames: vec![frame_at("script:3:1", 1)],
            },
            Step::Break {
                prints: vec![],
                frames: vec![frame_at("script:3:1", 2)],
            },
            Step::Terminate { prints: vec![] },
        ]),
        ..Plan::default()
    });

    controller.start_debug("loop body", &[3]).unwrap();
    let first = drain(&rx);
    let HostNotification::Debug(event) = first.last().unwrap() else {
        panic!("expected a debug event");
    };
    assert_eq!(event.reason, DEBUG_BREAK);
    let frames = event.frames.as_ref().unwrap();
    assert_eq!(frames[0].position, "script:3:1");
    assert_eq!(frames[0].variables[0].value, "1");

    controller.resume().unwrap();
    let second = drain(&rx);
    let HostNotification::Debug(event) = second.last().unwrap() else {
        panic!("expected a debug event");
    };
    let frames = event.frames.as_ref().unwrap();
    assert_eq!(frames[0].position, "script:3:1", "same line, next iteration");
    assert_eq!(frames[0].variables[0].value, "2");

    controller.resume().unwrap();
    assert!(!controller.is_debugging());
}

#[test]
fn compile_failure_leaves_the_controller_idle() {
    let (mut controller, rx) = controller(Plan {
        compile_error: Some("1:5: expected ';'"),
        ..Plan::default()
    });

    let err = controller.start_debug("x :=", &[1]).unwrap_err();
    assert_eq!(err, SessionError::Compile("1:5: expected ';'".to_owned()));
    assert!(!controller.is_debugging());

    let notifications = drain(&rx);
    assert_eq!(notifications, vec![HostNotification::SessionReset]);
}

#[test]
fn resume_failure_tears_the_session_down() {
    let (mut controller, rx) = controller(Plan {
        steps: VecDeque::from([
            Step::Break {
                prints: vec![],
                frames: vec![],
            },
            Step::Fail("runtime panic"),
        ]),
        ..Plan::default()
    });

    controller.start_debug("code", &[1]).unwrap();
    drain(&rx);

    let err = controller.resume().unwrap_err();
    assert_eq!(err, SessionError::Runtime("runtime panic".to_owned()));
    assert!(!controller.is_debugging());
    assert_eq!(drain(&rx), vec![HostNotification::SessionReset]);
}

#[test]
fn terminate_notification_is_preceded_by_the_reset() {
    let (mut controller, rx) = controller(Plan {
        steps: VecDeque::from([
            Step::Break {
                prints: vec![],
                frames: vec![],
            },
            Step::Terminate { prints: vec!["done\n"] },
        ]),
        ..Plan::default()
    });

    controller.start_debug("code", &[1]).unwrap();
    drain(&rx);

    let output = controller.resume().unwrap();
    assert_eq!(output, "done\n");
    assert!(!controller.is_debugging());

    let notifications = drain(&rx);
    let reset_index = notifications
        .iter()
        .position(|n| *n == HostNotification::SessionReset)
        .expect("a reset must be pushed");
    let terminate_index = notifications
        .iter()
        .position(|n| matches!(n, HostNotification::Debug(e) if e.reason == DEBUG_TERMINATE))
        .expect("a terminate event must be pushed");
    assert!(
        reset_index < terminate_index,
        "host must observe an idle session before the terminate event"
    );
}

#[test]
fn explicit_reset_is_idempotent() {
    let (mut controller, rx) = controller(Plan::default());
    controller.reset();
    controller.reset();
    assert_eq!(
        drain(&rx),
        vec![HostNotification::SessionReset, HostNotification::SessionReset]
    );
    assert!(!controller.is_debugging());
}
