//! Tests for Program and ProgramBuilder

use bytecode_system::{BuildError, Instruction, ProgramBuilder};
use core_types::{TextPosition, TextRange, Value};

#[test]
fn test_build_two_functions() {
    let mut builder = ProgramBuilder::new();
    let counter = builder.add_global("counter");
    builder.begin_function("first", &[], &[]).unwrap();
    builder.emit(Instruction::LoadValue(Value::Null));
    builder.emit(Instruction::Return);
    builder.end_function().unwrap();
    builder.begin_function("second", &["x"], &["y"]).unwrap();
    builder.add_local("z").unwrap();
    builder.emit(Instruction::LoadGlobalVar(counter));
    builder.emit(Instruction::Return);
    builder.end_function().unwrap();

    let program = builder.build().unwrap();
    assert_eq!(program.variable_names, vec!["counter".to_string()]);
    assert_eq!(program.functions.len(), 2);
    let second = program.function(1).unwrap();
    assert_eq!(second.first_instruction, 2);
    assert_eq!(second.last_instruction, 3);
    assert_eq!(second.fixed_variable_count(), 2);
    assert_eq!(second.captured_variable_names, vec!["y".to_string()]);
    assert_eq!(program.function_of(3), Some(1));
}

#[test]
fn test_unknown_function_is_rejected() {
    let mut builder = ProgramBuilder::new();
    builder.begin_function("f", &[], &[]).unwrap();
    builder.emit(Instruction::Invoke { function: 4, count: 0 });
    builder.end_function().unwrap();
    assert_eq!(
        builder.build().unwrap_err(),
        BuildError::UnknownFunction {
            instruction: 0,
            function: 4
        }
    );
}

#[test]
fn test_open_function_blocks_build() {
    let mut builder = ProgramBuilder::new();
    builder.begin_function("f", &[], &[]).unwrap();
    builder.emit(Instruction::Return);
    assert!(matches!(
        builder.build(),
        Err(BuildError::FunctionNotClosed(name)) if name == "f"
    ));
}

#[test]
fn test_before_and_after_codegen_tables_differ() {
    let mut builder = ProgramBuilder::new();
    let code = builder.add_module_code("a\nb");
    builder.begin_function("f", &[], &[]).unwrap();
    builder.emit_mapped(
        Instruction::Nop,
        Some(TextRange::line(code, 0)),
        Some(TextRange::line(code, 1)),
    );
    builder.emit_mapped(Instruction::Return, None, Some(TextRange::line(code, 1)));
    builder.end_function().unwrap();

    let program = builder.build().unwrap();
    let before = program.debug_info(true).unwrap();
    let after = program.debug_info(false).unwrap();
    assert_eq!(before.instructions_at(code, 0), &[0]);
    assert!(before.range(1).is_none());
    assert_eq!(after.instructions_at(code, 1), &[0, 1]);
    assert_eq!(after.source_line(code, 1), Some("b"));
}

#[test]
fn test_range_lookup() {
    let mut builder = ProgramBuilder::new();
    let code = builder.add_module_code("x");
    builder.begin_function("f", &[], &[]).unwrap();
    let range = TextRange::new(code, TextPosition::new(0, 0), TextPosition::new(0, 1));
    builder.emit_at(Instruction::Return, range);
    builder.end_function().unwrap();
    let program = builder.build().unwrap();
    assert_eq!(program.debug_info(true).unwrap().range(0), Some(&range));
}
