//! Breakpoints and run control for the bytecode interpreter.
//!
//! A [`Debugger`] is attached to an OS thread with
//! [`set_debugger_for_current_thread`]. Thread contexts started on that
//! thread consult it before every instruction and member access; a
//! controller thread uses [`Debugger::run`], [`Debugger::pause`],
//! [`Debugger::stop`], [`Debugger::step_over`] and [`Debugger::step_into`]
//! to drive them.
//!
//! # Overview
//!
//! - [`Breakpoint`] / [`BreakpointKind`] - What to break on
//! - [`BreakpointAction`] - Optional condition and post-action
//! - [`DebuggerState`] / [`RunningType`] - The run/pause/stop state machine
//! - [`InstructionLocation`] - Where a thread is, used to end steps
//! - [`ThreadContextInfo`] - Registered thread contexts and their snapshots
//!
//! # Examples
//!
//! ```
//! use bytecode_system::{Instruction, ProgramBuilder};
//! use core_types::TextRange;
//! use debugger::{Debugger, DebuggerError};
//!
//! let mut builder = ProgramBuilder::new();
//! let code = builder.add_module_code("return;");
//! builder.begin_function("main", &[], &[]).unwrap();
//! builder.emit_at(Instruction::Return, TextRange::line(code, 0));
//! builder.end_function().unwrap();
//! let program = builder.build().unwrap();
//!
//! let debugger = Debugger::new();
//! let ids = debugger.add_code_line_breakpoint(&program, code, 0, true).unwrap();
//! assert_eq!(ids.len(), 1);
//! assert_eq!(
//!     debugger.add_code_line_breakpoint(&program, code, 3, true),
//!     Err(DebuggerError::NoInstructionOnRow { code_index: code, row: 3 })
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod breakpoint;
pub mod current;
pub mod debugger;
pub mod error;
pub mod location;
pub mod registry;
pub mod state;
mod table;

// Re-export main types at crate root
pub use breakpoint::{Breakpoint, BreakpointAction, BreakpointId, BreakpointKind};
pub use current::{debugger_for_current_thread, set_debugger_for_current_thread};
pub use debugger::{Debugger, DebuggerObserver};
pub use error::DebuggerError;
pub use location::InstructionLocation;
pub use registry::ThreadContextInfo;
pub use state::{Activation, DebuggerState, RunningType};
