//! Stack and trap frames

use crate::variable::VariableContext;
use std::sync::Arc;

/// One active function call
///
/// The operand stack from `stack_base` holds the arguments, then the local
/// variables, then scratch values starting at `free_stack_base`.
#[derive(Debug, Clone)]
pub struct StackFrame {
    /// Captured variables of the executing closure
    pub captured: Option<Arc<VariableContext>>,
    /// Index of the executing function
    pub function_index: usize,
    /// Instruction to execute next
    pub next_instruction: usize,
    /// Operand stack height at entry, minus the arguments
    pub stack_base: usize,
    /// Number of argument and local variable slots
    pub fixed_variable_count: usize,
    /// First scratch slot of the operand stack
    pub free_stack_base: usize,
}

/// A protected region installed by `InstallTry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame {
    /// Index of the owning stack frame
    pub stack_frame_index: usize,
    /// Instruction the handler starts at
    pub handler: usize,
    /// Operand stack height to restore on unwind
    pub stack_height: usize,
}
