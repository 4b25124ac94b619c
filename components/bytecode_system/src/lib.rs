//! Instruction set and compiled program model
//!
//! This crate defines the instructions the interpreter executes and the
//! immutable [`Program`] that holds them together with function tables,
//! global variable names and two source-mapping tables.
//!
//! # Features
//!
//! - Stack-based instruction set with one typed payload per instruction
//! - Function descriptors with argument, captured and local variable names
//! - Before- and after-codegen debug tables mapping instructions to source rows
//! - [`ProgramBuilder`] for loaders and tests
//!
//! # Example
//!
//! ```
//! use bytecode_system::{InsCode, Instruction, ProgramBuilder};
//! use core_types::{TextRange, Value};
//!
//! let mut builder = ProgramBuilder::new();
//! let code = builder.add_module_code("return 42;");
//! builder.begin_function("main", &[], &[]).unwrap();
//! builder.emit_at(Instruction::LoadValue(Value::I32(42)), TextRange::line(code, 0));
//! builder.emit_at(Instruction::Return, TextRange::line(code, 0));
//! builder.end_function().unwrap();
//!
//! let program = builder.build().unwrap();
//! assert_eq!(program.instructions[1].code(), InsCode::Return);
//! assert_eq!(program.debug_info(true).unwrap().instructions_at(code, 0), &[0, 1]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export main types at crate root
pub use builder::{BuildError, ProgramBuilder};
pub use instruction::Instruction;
pub use opcode::{InsCode, InsType};
pub use program::{FunctionDescriptor, InstructionDebugInfo, Program};
