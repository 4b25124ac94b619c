//! Stack-based bytecode interpreter
//!
//! This crate executes [`bytecode_system::Program`]s:
//! - A [`ThreadContext`] per script thread with operand stack, stack frames
//!   and trap frames
//! - Exceptions carrying call-stack snapshots, caught by `InstallTry` handlers
//! - Host calls into script functions through [`load_function`]
//! - Debugger hooks consulted before each instruction and member access
//!
//! # Example
//!
//! ```
//! use bytecode_system::{InsType, Instruction, ProgramBuilder};
//! use core_types::Value;
//! use interpreter::{load_function, GlobalContext};
//! use std::sync::Arc;
//!
//! let mut builder = ProgramBuilder::new();
//! builder.begin_function("add", &["a", "b"], &[]).unwrap();
//! builder.emit(Instruction::LoadLocalVar(0));
//! builder.emit(Instruction::LoadLocalVar(1));
//! builder.emit(Instruction::OpAdd(InsType::I4));
//! builder.emit(Instruction::Return);
//! builder.end_function().unwrap();
//!
//! let global = Arc::new(GlobalContext::new(Arc::new(builder.build().unwrap())));
//! let add = load_function(&global, "add").unwrap();
//! assert_eq!(add.call(vec![Value::I32(2), Value::I32(3)]).unwrap(), Value::I32(5));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod debug_hook;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod frame;
pub mod function;
pub mod global;
pub mod interface;
pub mod operators;
pub mod variable;

// Re-export main types at crate root
pub use config::ThreadContextConfig;
pub use context::{ExecutionAction, ExecutionStatus, ThreadContext, STOPPED_BY_DEBUGGER};
pub use debug_hook::{current_debugger, set_current_debugger, DebuggerCallback};
pub use error::{LoadFunctionError, ThreadContextError};
pub use exception::{
    exception_type, CallStackInfo, ExceptionInfo, RuntimeException, VariableDictionary,
};
pub use frame::{StackFrame, TrapFrame};
pub use function::{load_function, ScriptFunction};
pub use global::{GlobalContext, INITIALIZE_FUNCTION};
pub use interface::InterfaceProxy;
pub use variable::VariableContext;
