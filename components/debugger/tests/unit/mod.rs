//! Unit tests for debugger
//!
//! Scripts run on a spawned thread with the debugger attached while the test
//! thread acts as the controller.

use bytecode_system::{InsType, Instruction, Program, ProgramBuilder};
use core_types::{TextRange, Value};
use debugger::{
    set_debugger_for_current_thread, Activation, Breakpoint, BreakpointAction, Debugger,
    DebuggerError, DebuggerObserver, DebuggerState, RunningType,
};
use interpreter::{load_function, GlobalContext, RuntimeException, STOPPED_BY_DEBUGGER};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

const SOURCE: &str = "let a = 1;
let b = f(a);
return b;
func f(x) {
  let y = x + 10;
  return y;
}";

/// `main` calls `f(1)` and returns 11.
///
/// Instructions by row: 0 -> 0..=1, 1 -> 2..=4, 2 -> 5..=6, 4 -> 7..=10,
/// 5 -> 11..=12.
fn create_program() -> Arc<Program> {
    let mut builder = ProgramBuilder::new();
    let code = builder.add_module_code(SOURCE);
    let row = |r| TextRange::line(code, r);

    builder.begin_function("main", &[], &[]).unwrap();
    builder.add_local("a").unwrap();
    builder.add_local("b").unwrap();
    builder.emit_at(Instruction::LoadValue(Value::I32(1)), row(0));
    builder.emit_at(Instruction::StoreLocalVar(0), row(0));
    builder.emit_at(Instruction::LoadLocalVar(0), row(1));
    builder.emit_at(Instruction::Invoke { function: 1, count: 1 }, row(1));
    builder.emit_at(Instruction::StoreLocalVar(1), row(1));
    builder.emit_at(Instruction::LoadLocalVar(1), row(2));
    builder.emit_at(Instruction::Return, row(2));
    builder.end_function().unwrap();

    builder.begin_function("f", &["x"], &[]).unwrap();
    builder.add_local("y").unwrap();
    builder.emit_at(Instruction::LoadLocalVar(0), row(4));
    builder.emit_at(Instruction::LoadValue(Value::I32(10)), row(4));
    builder.emit_at(Instruction::OpAdd(InsType::I4), row(4));
    builder.emit_at(Instruction::StoreLocalVar(1), row(4));
    builder.emit_at(Instruction::LoadLocalVar(1), row(5));
    builder.emit_at(Instruction::Return, row(5));
    builder.end_function().unwrap();

    Arc::new(builder.build().unwrap())
}

/// `main` spins forever.
fn create_loop_program() -> Arc<Program> {
    let mut builder = ProgramBuilder::new();
    builder.begin_function("main", &[], &[]).unwrap();
    builder.emit(Instruction::Nop);
    builder.emit(Instruction::Jump(0));
    builder.end_function().unwrap();
    Arc::new(builder.build().unwrap())
}

/// `main` reads global `counter` and writes it back plus one.
fn create_global_program() -> Arc<Program> {
    let mut builder = ProgramBuilder::new();
    builder.add_global("counter");
    builder.begin_function("main", &[], &[]).unwrap();
    builder.emit(Instruction::LoadValue(Value::I32(0)));
    builder.emit(Instruction::StoreGlobalVar(0));
    builder.emit(Instruction::LoadGlobalVar(0));
    builder.emit(Instruction::LoadValue(Value::I32(1)));
    builder.emit(Instruction::OpAdd(InsType::I4));
    builder.emit(Instruction::StoreGlobalVar(0));
    builder.emit(Instruction::LoadGlobalVar(0));
    builder.emit(Instruction::Return);
    builder.end_function().unwrap();
    Arc::new(builder.build().unwrap())
}

fn call_main(debugger: &Arc<Debugger>, program: &Arc<Program>) -> Result<Value, RuntimeException> {
    set_debugger_for_current_thread(Some(debugger.clone()));
    let global = Arc::new(GlobalContext::new(program.clone()));
    let result = load_function(&global, "main").unwrap().call(vec![]);
    set_debugger_for_current_thread(None);
    result
}

fn spawn_main(
    debugger: &Arc<Debugger>,
    program: &Arc<Program>,
) -> JoinHandle<Result<Value, RuntimeException>> {
    let debugger = debugger.clone();
    let program = program.clone();
    thread::spawn(move || call_main(&debugger, &program))
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
fn test_stopped_debugger_aborts_execution() {
    let debugger = Arc::new(Debugger::new());
    let error = call_main(&debugger, &create_program()).unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.message(), STOPPED_BY_DEBUGGER);
}

#[test]
fn test_running_without_breakpoints_completes() {
    let debugger = Arc::new(Debugger::new());
    assert!(debugger.run());
    assert_eq!(call_main(&debugger, &create_program()).unwrap(), Value::I32(11));
    assert_eq!(debugger.state(), DebuggerState::Running);
    assert!(debugger.thread_contexts().is_empty());
}

#[test]
fn test_pause_and_stop_running_thread() {
    let debugger = Arc::new(Debugger::new());
    debugger.run();
    let handle = spawn_main(&debugger, &create_loop_program());

    assert!(debugger.pause());
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.state(), DebuggerState::PauseByOperation);
    assert_eq!(debugger.last_activated_breakpoint(), Some(Activation::Pause));

    assert!(debugger.stop());
    let error = handle.join().unwrap().unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.message(), STOPPED_BY_DEBUGGER);
    assert_eq!(debugger.state(), DebuggerState::Stopped);
}

#[test]
fn test_stop_running_thread_without_pause() {
    let debugger = Arc::new(Debugger::new());
    debugger.run();
    let handle = spawn_main(&debugger, &create_loop_program());
    while debugger.thread_contexts().is_empty() {
        thread::yield_now();
    }
    assert!(debugger.stop());
    assert!(handle.join().unwrap().is_err());
    assert!(debugger.wait_until_stopped(TIMEOUT));
}

#[test]
fn test_pause_from_stopped_breaks_before_first_instruction() {
    let debugger = Arc::new(Debugger::new());
    assert!(debugger.pause());
    let handle = spawn_main(&debugger, &create_program());

    assert!(debugger.wait_until_paused(TIMEOUT));
    let position = debugger.current_position(true, None, 0).unwrap();
    assert_eq!(position.row(), 0);

    assert!(debugger.run());
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
}

// ============================================================================
// Breakpoints
// ============================================================================

#[test]
fn test_instruction_breakpoint_pauses_before_instruction() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    let id = debugger
        .add_breakpoint(Breakpoint::instruction(&program, 3))
        .unwrap();
    debugger.run();
    let handle = spawn_main(&debugger, &program);

    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.state(), DebuggerState::PauseByBreakPoint);
    assert_eq!(
        debugger.last_activated_breakpoint(),
        Some(Activation::Breakpoint(id))
    );
    assert_eq!(debugger.value_by_name("a", None, 0).unwrap(), Value::I32(1));
    assert_eq!(debugger.value_by_name("b", None, 0).unwrap(), Value::Null);
    assert_eq!(debugger.current_position(true, None, 0).unwrap().row(), 1);

    let contexts = debugger.thread_contexts();
    assert_eq!(contexts.len(), 1);
    assert!(contexts[0].is_paused());
    assert_eq!(contexts[0].location.as_ref().unwrap().instruction, 3);

    assert!(debugger.run());
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
    assert_eq!(debugger.state(), DebuggerState::Running);
}

#[test]
fn test_removed_breakpoint_does_not_pause() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    let id = debugger
        .add_breakpoint(Breakpoint::instruction(&program, 3))
        .unwrap();
    debugger.remove_breakpoint(id).unwrap();
    debugger.run();
    assert_eq!(call_main(&debugger, &program).unwrap(), Value::I32(11));

    let next = debugger
        .add_breakpoint(Breakpoint::instruction(&program, 3))
        .unwrap();
    assert!(next > id);
    assert_eq!(
        debugger.remove_breakpoint(id),
        Err(DebuggerError::UnknownBreakpoint(id))
    );
}

#[test]
fn test_disabled_breakpoint_does_not_pause() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    let id = debugger
        .add_breakpoint(Breakpoint::instruction(&program, 0))
        .unwrap();
    debugger.enable_breakpoint(id, false).unwrap();
    debugger.run();
    assert_eq!(call_main(&debugger, &program).unwrap(), Value::I32(11));
    assert!(!debugger.breakpoint(id).unwrap().is_enabled());
}

#[test]
fn test_breakpoint_of_other_program_does_not_pause() {
    let debugger = Arc::new(Debugger::new());
    debugger
        .add_breakpoint(Breakpoint::instruction(&create_program(), 0))
        .unwrap();
    debugger.run();
    assert_eq!(
        call_main(&debugger, &create_program()).unwrap(),
        Value::I32(11)
    );
}

#[test]
fn test_code_line_breakpoint() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    let ids = debugger
        .add_code_line_breakpoint(&program, 0, 4, true)
        .unwrap();
    assert_eq!(ids.len(), 1);
    assert!(matches!(
        debugger.breakpoint(ids[0]).unwrap().kind(),
        debugger::BreakpointKind::Instruction { instruction: 7, .. }
    ));
    assert_eq!(
        debugger.add_code_line_breakpoint(&program, 0, 4, true),
        Err(DebuggerError::DuplicateBreakpoint(ids[0]))
    );
    assert_eq!(
        debugger.add_code_line_breakpoint(&program, 0, 3, true),
        Err(DebuggerError::NoInstructionOnRow {
            code_index: 0,
            row: 3
        })
    );

    debugger.run();
    let handle = spawn_main(&debugger, &program);
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.value_by_name("x", None, 0).unwrap(), Value::I32(1));
    assert_eq!(debugger.current_position(true, None, 1).unwrap().row(), 1);
    assert_eq!(
        debugger.current_position(true, None, 2),
        Err(DebuggerError::CallStackIndexOutOfRange(2))
    );
    debugger.run();
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
}

#[test]
fn test_code_line_breakpoint_requires_debug_info() {
    let debugger = Debugger::new();
    assert_eq!(
        debugger.add_code_line_breakpoint(&create_loop_program(), 0, 0, true),
        Err(DebuggerError::MissingDebugInfo)
    );
}

#[test]
fn test_global_variable_breakpoints() {
    let program = create_global_program();
    let debugger = Arc::new(Debugger::new());
    let read = debugger.add_breakpoint(Breakpoint::read(&program, 0)).unwrap();
    let write = debugger.add_breakpoint(Breakpoint::write(&program, 0)).unwrap();
    debugger.run();
    let handle = spawn_main(&debugger, &program);

    // StoreGlobalVar(0) at instruction 1
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(
        debugger.last_activated_breakpoint(),
        Some(Activation::Breakpoint(write))
    );
    assert_eq!(
        debugger.value_by_name("counter", None, 0).unwrap(),
        Value::Null
    );
    debugger.remove_breakpoint(write).unwrap();
    debugger.run();

    // LoadGlobalVar(0) at instruction 2
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(
        debugger.last_activated_breakpoint(),
        Some(Activation::Breakpoint(read))
    );
    assert_eq!(
        debugger.value_by_name("counter", None, 0).unwrap(),
        Value::I32(0)
    );
    debugger.remove_breakpoint(read).unwrap();
    debugger.run();

    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(1));
}

// ============================================================================
// Conditions
// ============================================================================

#[derive(Default)]
struct CountingAction {
    result: bool,
    evaluated: AtomicUsize,
    posted: AtomicUsize,
}

impl BreakpointAction for CountingAction {
    fn evaluate_condition(&self, _debugger: &Debugger) -> bool {
        self.evaluated.fetch_add(1, Ordering::SeqCst);
        self.result
    }

    fn post_action(&self, _debugger: &Debugger) {
        self.posted.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_false_condition_skips_breakpoint() {
    let program = create_program();
    let action = Arc::new(CountingAction::default());
    let debugger = Arc::new(Debugger::new());
    debugger
        .add_breakpoint(Breakpoint::instruction(&program, 3).with_action(action.clone()))
        .unwrap();
    debugger.run();
    assert_eq!(call_main(&debugger, &program).unwrap(), Value::I32(11));
    assert_eq!(action.evaluated.load(Ordering::SeqCst), 1);
    assert_eq!(action.posted.load(Ordering::SeqCst), 0);
    assert_eq!(debugger.last_activated_breakpoint(), None);
}

#[test]
fn test_true_condition_runs_post_action() {
    let program = create_program();
    let action = Arc::new(CountingAction {
        result: true,
        ..CountingAction::default()
    });
    let debugger = Arc::new(Debugger::new());
    debugger
        .add_breakpoint(Breakpoint::instruction(&program, 3).with_action(action.clone()))
        .unwrap();
    debugger.run();
    let handle = spawn_main(&debugger, &program);
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(action.posted.load(Ordering::SeqCst), 1);
    debugger.run();
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
    assert_eq!(action.evaluated.load(Ordering::SeqCst), 1);
}

/// Breaks in `f` only when `x` has the expected value.
struct ArgumentIs(Value);

impl BreakpointAction for ArgumentIs {
    fn evaluate_condition(&self, debugger: &Debugger) -> bool {
        debugger.value_by_name("x", None, 0).ok().as_ref() == Some(&self.0)
    }
}

#[test]
fn test_condition_reads_variables() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    let skipped = debugger
        .add_breakpoint(
            Breakpoint::instruction(&program, 7).with_action(Arc::new(ArgumentIs(Value::I32(2)))),
        )
        .unwrap();
    debugger.run();
    assert_eq!(call_main(&debugger, &program).unwrap(), Value::I32(11));

    debugger.remove_breakpoint(skipped).unwrap();
    let hit = debugger
        .add_breakpoint(
            Breakpoint::instruction(&program, 7).with_action(Arc::new(ArgumentIs(Value::I32(1)))),
        )
        .unwrap();
    let handle = spawn_main(&debugger, &program);
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(
        debugger.last_activated_breakpoint(),
        Some(Activation::Breakpoint(hit))
    );
    debugger.run();
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
}

// ============================================================================
// Stepping
// ============================================================================

#[test]
fn test_step_over_does_not_enter_callee() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    debugger
        .add_breakpoint(Breakpoint::instruction(&program, 2))
        .unwrap();
    debugger.run();
    let handle = spawn_main(&debugger, &program);

    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.current_position(true, None, 0).unwrap().row(), 1);
    assert!(debugger.step_over(true));
    assert_eq!(debugger.running_type(), RunningType::RunStepOver);

    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.state(), DebuggerState::PauseByOperation);
    assert_eq!(debugger.current_position(true, None, 0).unwrap().row(), 2);
    assert_eq!(debugger.value_by_name("b", None, 0).unwrap(), Value::I32(11));

    debugger.run();
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
}

#[test]
fn test_step_into_stops_at_callee_first_row() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    debugger
        .add_breakpoint(Breakpoint::instruction(&program, 2))
        .unwrap();
    debugger.run();
    let handle = spawn_main(&debugger, &program);

    assert!(debugger.wait_until_paused(TIMEOUT));
    assert!(debugger.step_into(true));

    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.current_position(true, None, 0).unwrap().row(), 4);
    assert_eq!(debugger.value_by_name("x", None, 0).unwrap(), Value::I32(1));
    let context = debugger.current_thread_context().unwrap();
    assert_eq!(context.call_stack.len(), 2);
    assert_eq!(context.location.unwrap().stack_frame_index, 1);

    assert!(debugger.step_over(true));
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.current_position(true, None, 0).unwrap().row(), 5);
    assert_eq!(debugger.value_by_name("y", None, 0).unwrap(), Value::I32(11));

    // Returning to the caller ends the step in the caller's frame.
    assert!(debugger.step_over(true));
    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(debugger.current_position(true, None, 0).unwrap().row(), 1);
    assert_eq!(
        debugger.current_thread_context().unwrap().call_stack.len(),
        1
    );

    debugger.run();
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
}

// ============================================================================
// Exceptions and observers
// ============================================================================

fn create_raising_program() -> Arc<Program> {
    let mut builder = ProgramBuilder::new();
    builder.begin_function("main", &[], &[]).unwrap();
    builder.emit(Instruction::LoadValue(Value::string("boom")));
    builder.emit(Instruction::RaiseException);
    builder.emit(Instruction::Return);
    builder.end_function().unwrap();
    Arc::new(builder.build().unwrap())
}

#[test]
fn test_exception_breakpoint() {
    let program = create_raising_program();
    let debugger = Arc::new(Debugger::new());
    debugger.set_break_exception(true);
    debugger.run();
    let handle = spawn_main(&debugger, &program);

    assert!(debugger.wait_until_paused(TIMEOUT));
    assert_eq!(
        debugger.last_activated_breakpoint(),
        Some(Activation::Exception)
    );
    debugger.run();
    let error = handle.join().unwrap().unwrap_err();
    assert_eq!(error.message(), "boom");
    assert!(!error.is_fatal());
}

#[test]
fn test_exception_without_flag_does_not_pause() {
    let debugger = Arc::new(Debugger::new());
    debugger.run();
    let error = call_main(&debugger, &create_raising_program()).unwrap_err();
    assert_eq!(error.message(), "boom");
    assert_eq!(debugger.last_activated_breakpoint(), None);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<&'static str>>,
}

impl DebuggerObserver for Recorder {
    fn on_start_execution(&self, _debugger: &Debugger) {
        self.events.lock().unwrap().push("start");
    }

    fn on_block_execution(&self, _debugger: &Debugger) {
        let mut events = self.events.lock().unwrap();
        if events.last() != Some(&"block") {
            events.push("block");
        }
    }

    fn on_stop_execution(&self, _debugger: &Debugger) {
        self.events.lock().unwrap().push("stop");
    }
}

#[test]
fn test_observer_sees_session_lifecycle() {
    let recorder = Arc::new(Recorder::default());
    let debugger = Arc::new(Debugger::with_observer(recorder.clone()));
    debugger.run();
    let handle = spawn_main(&debugger, &create_loop_program());

    debugger.pause();
    assert!(debugger.wait_until_paused(TIMEOUT));
    debugger.stop();
    assert!(handle.join().unwrap().is_err());

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["start", "block", "stop"]
    );
}

#[test]
fn test_two_threads_pause_together() {
    let program = create_program();
    let debugger = Arc::new(Debugger::new());
    let id = debugger
        .add_breakpoint(Breakpoint::instruction(&program, 7))
        .unwrap();
    debugger.run();
    let first = spawn_main(&debugger, &program);
    let second = spawn_main(&debugger, &program);

    assert!(debugger.wait_until_paused(TIMEOUT));
    let mut paused = 0;
    for _ in 0..500 {
        paused = debugger
            .thread_contexts()
            .iter()
            .filter(|context| context.is_paused())
            .count();
        if paused == 2 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(paused, 2);

    debugger.remove_breakpoint(id).unwrap();
    debugger.run();
    assert_eq!(first.join().unwrap().unwrap(), Value::I32(11));
    assert_eq!(second.join().unwrap().unwrap(), Value::I32(11));
}
