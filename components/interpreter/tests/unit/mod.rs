//! Unit tests for interpreter components

use bytecode_system::{InsType, Instruction, ProgramBuilder};
use core_types::{builtin_type, Value, ValueType};
use interpreter::{
    ExecutionAction, ExecutionStatus, ThreadContext, ThreadContextConfig, ThreadContextError,
    VariableContext,
};
use std::sync::Arc;

fn single_function(arguments: &[&str], locals: &[&str], body: Vec<Instruction>) -> ThreadContext {
    let mut builder = ProgramBuilder::new();
    builder.add_global("g");
    builder.begin_function("main", arguments, &[]).unwrap();
    for local in locals {
        builder.add_local(local).unwrap();
    }
    for instruction in body {
        builder.emit(instruction);
    }
    builder.end_function().unwrap();
    ThreadContext::new(Arc::new(builder.build().unwrap()))
}

fn evaluate(body: Vec<Instruction>) -> Value {
    let mut context = single_function(&[], &[], body);
    context.push_stack_frame(0, 0, None).unwrap();
    assert_eq!(context.execute_to_end(), ExecutionStatus::Finished);
    context.pop_value().unwrap()
}

// ============================================================================
// ThreadContext Tests
// ============================================================================

#[test]
fn test_new_context_is_ready() {
    let context = single_function(&[], &[], vec![Instruction::Return]);
    assert_eq!(context.status(), ExecutionStatus::Ready);
    assert!(context.frames().is_empty());
    assert!(context.exception().is_none());
}

#[test]
fn test_execute_without_frames_is_nop() {
    let mut context = single_function(&[], &[], vec![Instruction::Return]);
    assert_eq!(context.execute(None), ExecutionAction::Nop);
    assert_eq!(context.execute_to_end(), ExecutionStatus::Ready);
}

#[test]
fn test_execute_reports_actions() {
    let mut context = single_function(
        &[],
        &[],
        vec![Instruction::LoadValue(Value::I32(1)), Instruction::Return],
    );
    context.push_stack_frame(0, 0, None).unwrap();
    assert_eq!(context.execute(None), ExecutionAction::ExecuteInstruction);
    assert_eq!(context.execute(None), ExecutionAction::ExitStackFrame);
    assert_eq!(context.status(), ExecutionStatus::Finished);
    assert_eq!(context.execute(None), ExecutionAction::Nop);
}

#[test]
fn test_push_pop_is_balanced() {
    let mut context = single_function(&[], &[], vec![Instruction::Return]);
    context.push_stack_frame(0, 0, None).unwrap();
    let height = context.stack().len();
    for n in 0..5 {
        context.push_value(Value::I32(n));
    }
    for n in (0..5).rev() {
        assert_eq!(context.pop_value().unwrap(), Value::I32(n));
    }
    assert_eq!(context.stack().len(), height);
}

#[test]
fn test_pop_value_on_empty_stack() {
    let mut context = single_function(&[], &[], vec![Instruction::Return]);
    assert_eq!(context.pop_value(), Err(ThreadContextError::EmptyStack));
}

#[test]
fn test_pop_stack_frame_without_frame() {
    let mut context = single_function(&[], &[], vec![Instruction::Return]);
    assert_eq!(
        context.pop_stack_frame(),
        Err(ThreadContextError::EmptyStackFrame)
    );
    assert_eq!(
        context.push_trap_frame(0),
        Err(ThreadContextError::EmptyStackFrame)
    );
}

#[test]
fn test_store_and_load_local() {
    let mut context = single_function(&["a"], &["x"], vec![Instruction::Return]);
    context.push_value(Value::I32(1));
    context.push_stack_frame(0, 1, None).unwrap();
    context.store_local_variable(1, Value::string("v")).unwrap();
    assert_eq!(context.load_local_variable(1).unwrap(), Value::string("v"));
    assert_eq!(
        context.store_local_variable(2, Value::Null),
        Err(ThreadContextError::WrongLocalVariableIndex)
    );
}

#[test]
fn test_captured_variable_count_is_checked() {
    let mut context = single_function(&[], &[], vec![Instruction::Return]);
    let captured = Arc::new(VariableContext::new(1));
    assert_eq!(
        context.push_stack_frame(0, 0, Some(captured)),
        Err(ThreadContextError::WrongCapturedVariableCount)
    );
}

#[test]
fn test_load_captured_without_closure() {
    let mut context = single_function(&[], &[], vec![Instruction::Return]);
    context.push_stack_frame(0, 0, None).unwrap();
    assert_eq!(
        context.load_captured_variable(0),
        Err(ThreadContextError::WrongCapturedVariableIndex)
    );
}

#[test]
fn test_load_stack_value_below_scratch_region() {
    let mut context = single_function(&["a"], &[], vec![Instruction::Return]);
    context.push_value(Value::I32(1));
    context.push_stack_frame(0, 1, None).unwrap();
    context.push_value(Value::I32(2));
    assert_eq!(
        context.load_stack_value(0),
        Err(ThreadContextError::WrongStackItemIndex)
    );
    assert_eq!(context.load_stack_value(1).unwrap(), Value::I32(2));
}

#[test]
fn test_config_is_applied() {
    let program = single_function(&[], &[], vec![Instruction::Return])
        .program()
        .clone();
    let global = Arc::new(interpreter::GlobalContext::new(program));
    let config = ThreadContextConfig::default().with_max_call_depth(3);
    let context = ThreadContext::with_config(global, config);
    assert_eq!(context.config().max_call_depth, 3);
}

// ============================================================================
// Instruction Tests
// ============================================================================

#[test]
fn test_store_and_load_global() {
    let mut context = single_function(
        &[],
        &[],
        vec![
            Instruction::LoadValue(Value::I32(9)),
            Instruction::StoreGlobalVar(0),
            Instruction::LoadGlobalVar(0),
            Instruction::Return,
        ],
    );
    context.push_stack_frame(0, 0, None).unwrap();
    context.execute_to_end();
    assert_eq!(context.pop_value().unwrap(), Value::I32(9));
    assert_eq!(context.global().global_by_name("g"), Some(Value::I32(9)));
}

#[test]
fn test_jump_if_branches() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::Bool(true)),
        Instruction::JumpIf(4),
        Instruction::LoadValue(Value::string("fallthrough")),
        Instruction::Return,
        Instruction::LoadValue(Value::string("taken")),
        Instruction::Return,
    ]);
    assert_eq!(value, Value::string("taken"));
}

#[test]
fn test_create_map() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::string("a")),
        Instruction::LoadValue(Value::I32(1)),
        Instruction::LoadValue(Value::string("b")),
        Instruction::LoadValue(Value::I32(2)),
        Instruction::CreateMap(4),
        Instruction::Return,
    ]);
    let Value::Map(entries) = value else {
        panic!("expected a map");
    };
    let entries = entries.read();
    assert_eq!(entries.len(), 2);
    assert!(entries.contains(&(Value::string("a"), Value::I32(1))));
    assert!(entries.contains(&(Value::string("b"), Value::I32(2))));
}

#[test]
fn test_odd_pair_count_is_rejected() {
    for instruction in [Instruction::CreateMap(3), Instruction::CreateInterface(1)] {
        let code = instruction.code();
        let mut context = single_function(
            &[],
            &[],
            vec![
                Instruction::LoadValue(Value::string("a")),
                Instruction::LoadValue(Value::I32(1)),
                Instruction::LoadValue(Value::I32(2)),
                instruction,
                Instruction::Return,
            ],
        );
        context.push_stack_frame(0, 0, None).unwrap();
        assert_eq!(context.execute_to_end(), ExecutionStatus::FatalError);
        assert_eq!(
            context.exception().unwrap().message(),
            format!("internal error in {}: stack corrupted", code)
        );
    }
}

#[test]
fn test_create_range_and_membership() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::I32(3)),
        Instruction::LoadValue(Value::I32(1)),
        Instruction::LoadValue(Value::I32(5)),
        Instruction::CreateRange(InsType::I4),
        Instruction::TestElementInSet,
        Instruction::Return,
    ]);
    assert_eq!(value, Value::Bool(true));
}

#[test]
fn test_reverse_range() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::I32(1)),
        Instruction::LoadValue(Value::I32(3)),
        Instruction::CreateRange(InsType::I4),
        Instruction::ReverseEnumerable,
        Instruction::Return,
    ]);
    let Value::Range(range) = value else {
        panic!("expected a range");
    };
    let items: Vec<Value> = range.iter().collect();
    assert_eq!(items, vec![Value::I32(3), Value::I32(2), Value::I32(1)]);
}

#[test]
fn test_convert_and_test_type() {
    let int32 = builtin_type(ValueType::I32);
    assert_eq!(
        evaluate(vec![
            Instruction::LoadValue(Value::string("12")),
            Instruction::ConvertToType(int32.clone()),
            Instruction::Return,
        ]),
        Value::I32(12)
    );
    assert_eq!(
        evaluate(vec![
            Instruction::LoadValue(Value::string("twelve")),
            Instruction::TryConvertToType(int32.clone()),
            Instruction::Return,
        ]),
        Value::Null
    );
    assert_eq!(
        evaluate(vec![
            Instruction::LoadValue(Value::I32(1)),
            Instruction::TestType(int32),
            Instruction::Return,
        ]),
        Value::Bool(true)
    );
}

#[test]
fn test_get_type() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::F64(1.0)),
        Instruction::GetType,
        Instruction::Return,
    ]);
    let Value::Type(ty) = value else {
        panic!("expected a type");
    };
    assert_eq!(ty.type_name(), "system::Double");
}

#[test]
fn test_compare_literal_and_test() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::I32(1)),
        Instruction::LoadValue(Value::I32(2)),
        Instruction::CompareLiteral(InsType::I4),
        Instruction::OpLT,
        Instruction::Return,
    ]);
    assert_eq!(value, Value::Bool(true));
}

#[test]
fn test_compare_struct_and_reference() {
    let list = Value::new_list(vec![Value::I32(1)]);
    let same_shape = Value::new_list(vec![Value::I32(1)]);
    assert_eq!(
        evaluate(vec![
            Instruction::LoadValue(list.clone()),
            Instruction::LoadValue(same_shape.clone()),
            Instruction::CompareStruct,
            Instruction::Return,
        ]),
        Value::Bool(true)
    );
    assert_eq!(
        evaluate(vec![
            Instruction::LoadValue(list),
            Instruction::LoadValue(same_shape),
            Instruction::CompareReference,
            Instruction::Return,
        ]),
        Value::Bool(false)
    );
}

#[test]
fn test_compare_value_across_tags() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::I8(3)),
        Instruction::LoadValue(Value::U64(3)),
        Instruction::CompareValue,
        Instruction::Return,
    ]);
    assert_eq!(value, Value::Bool(true));
}

#[test]
fn test_concat() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::string("x = ")),
        Instruction::LoadValue(Value::I32(4)),
        Instruction::OpConcat,
        Instruction::Return,
    ]);
    assert_eq!(value, Value::string("x = 4"));
}

#[test]
fn test_wrapping_add() {
    let value = evaluate(vec![
        Instruction::LoadValue(Value::I32(i32::MAX)),
        Instruction::LoadValue(Value::I32(1)),
        Instruction::OpAdd(InsType::I4),
        Instruction::Return,
    ]);
    assert_eq!(value, Value::I32(i32::MIN));
}
