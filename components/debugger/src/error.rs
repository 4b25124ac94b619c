//! Debugger error types

use crate::breakpoint::BreakpointId;
use core_types::HandleId;
use thiserror::Error;

/// Failure of a breakpoint or inspection request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebuggerError {
    /// A breakpoint with the same kind and target already exists
    #[error("breakpoint already exists as {0}")]
    DuplicateBreakpoint(BreakpointId),

    /// No live breakpoint has this id
    #[error("unknown breakpoint {0}")]
    UnknownBreakpoint(BreakpointId),

    /// The program was compiled without the requested debug table
    #[error("program has no debug information")]
    MissingDebugInfo,

    /// No instruction is mapped to the source row
    #[error("no instruction on row {row} of code {code_index}")]
    NoInstructionOnRow {
        /// Module code index
        code_index: usize,
        /// Row, starting from 0
        row: usize,
    },

    /// The thread context is not registered with the debugger
    #[error("unknown thread context {0}")]
    UnknownThreadContext(HandleId),

    /// The thread context has no snapshot because it is not paused
    #[error("no paused thread context")]
    NotPaused,

    /// The call stack of the paused thread is shallower than requested
    #[error("call stack index {0} out of range")]
    CallStackIndexOutOfRange(usize),

    /// No variable with this name is visible from the frame
    #[error("variable {0} not found")]
    UnknownVariable(String),

    /// The executing instruction is not mapped to source
    #[error("instruction {0} has no source position")]
    NoSourcePosition(usize),
}
