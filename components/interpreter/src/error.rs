//! Structural errors of a thread context
//!
//! These indicate a malformed program or a VM bug. The dispatcher turns any
//! of them into a fatal exception.

use thiserror::Error;

/// Failure of a stack, frame or variable operation on a thread context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ThreadContextError {
    /// Stack item index outside the current frame's scratch region
    #[error("wrong stack item index")]
    WrongStackItemIndex,
    /// Local variable or argument index out of range
    #[error("wrong local variable index")]
    WrongLocalVariableIndex,
    /// Captured variable index out of range
    #[error("wrong captured variable index")]
    WrongCapturedVariableIndex,
    /// Global variable index out of range
    #[error("wrong global variable index")]
    WrongGlobalVariableIndex,
    /// Function index out of range
    #[error("wrong function index")]
    WrongFunctionIndex,
    /// Argument count does not match the function
    #[error("wrong argument count")]
    WrongArgumentCount,
    /// Captured variable count does not match the function
    #[error("wrong captured variable count")]
    WrongCapturedVariableCount,
    /// No stack frame
    #[error("empty stack frame list")]
    EmptyStackFrame,
    /// No trap frame
    #[error("empty trap frame list")]
    EmptyTrapFrame,
    /// No value on the operand stack
    #[error("empty stack")]
    EmptyStack,
    /// A trap frame does not belong to the expected stack frame
    #[error("trap frame corrupted")]
    TrapFrameCorrupted,
    /// The operand stack does not match the frame bookkeeping
    #[error("stack corrupted")]
    StackCorrupted,
}

/// Failure of [`load_function`](crate::load_function).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFunctionError {
    /// No function has the name
    #[error("function {0} does not exist")]
    NotFound(String),
    /// Several functions share the name
    #[error("function {name} is ambiguous, {count} functions share the name")]
    Ambiguous {
        /// Requested name
        name: String,
        /// Number of functions with that name
        count: usize,
    },
}
