//! Integration tests for bytecode_system and interpreter
//!
//! Programs are reassembled from serialized tables, the way a host loads
//! a compiled module, and then executed and debugged.

use bytecode_system::{FunctionDescriptor, InstructionDebugInfo, Program};
use core_types::Value;
use debugger::{Debugger, DebuggerError};
use integration_tests::fixtures::{closure_program, spawn_main, CLOSURE_SOURCE};
use interpreter::{load_function, GlobalContext};
use std::sync::Arc;
use std::time::Duration;

fn reload(program: &Program) -> Program {
    let functions = serde_json::to_string(&program.functions).unwrap();
    let debug_info = serde_json::to_string(program.debug_info(true).unwrap()).unwrap();

    let functions: Vec<FunctionDescriptor> = serde_json::from_str(&functions).unwrap();
    let debug_info: InstructionDebugInfo = serde_json::from_str(&debug_info).unwrap();
    Program::new(
        program.variable_names.clone(),
        functions,
        program.instructions.clone(),
        Some(debug_info),
        None,
    )
}

// ============================================================================
// Reloaded programs
// ============================================================================

#[test]
fn test_reloaded_program_executes() {
    let program = Arc::new(reload(&closure_program().unwrap()));
    assert_eq!(program.functions_named("double"), &[1]);

    let global = Arc::new(GlobalContext::new(program));
    let main = load_function(&global, "main").unwrap();
    assert_eq!(main.call(vec![]).unwrap(), Value::I32(11));
}

#[test]
fn test_reloaded_debug_info_maps_rows() {
    let original = closure_program().unwrap();
    let program = reload(&original);
    let info = program.debug_info(true).unwrap();

    assert_eq!(info, original.debug_info(true).unwrap());
    assert_eq!(info.module_codes, vec![CLOSURE_SOURCE.to_string()]);
    assert_eq!(info.instructions_at(0, 1), &[8, 9, 10, 11]);
    assert_eq!(info.source_line(0, 1), Some("  return x * 2;"));
    assert!(program.debug_info(false).is_none());
}

#[test]
fn test_line_breakpoint_on_reloaded_program() {
    let program = Arc::new(reload(&closure_program().unwrap()));
    let debugger = Arc::new(Debugger::new());
    assert_eq!(
        debugger.add_code_line_breakpoint(&program, 0, 1, false),
        Err(DebuggerError::MissingDebugInfo)
    );
    let ids = debugger
        .add_code_line_breakpoint(&program, 0, 1, true)
        .unwrap();
    assert_eq!(ids.len(), 1);

    debugger.run();
    let handle = spawn_main(&debugger, &program, vec![]).unwrap();
    assert!(debugger.wait_until_paused(Duration::from_secs(5)));
    assert_eq!(debugger.value_by_name("x", None, 0).unwrap(), Value::I32(5));
    assert_eq!(
        debugger.current_position(true, None, 0).unwrap().row(),
        1
    );

    debugger.run();
    assert_eq!(handle.join().unwrap().unwrap(), Value::I32(11));
}
