//! Execution positions and step targets

use bytecode_system::Program;
use core_types::TextRange;
use std::cmp::Ordering;
use std::sync::Arc;
use std::thread::ThreadId;

/// Position of an executing thread.
///
/// `context_index` counts the thread contexts nested below this one on the
/// same OS thread, so a closure called through a proxy is deeper than its
/// caller even though it runs in a fresh context.
#[derive(Debug, Clone)]
pub struct InstructionLocation {
    /// OS thread running the context
    pub thread: ThreadId,
    /// Nesting level of the thread context on its OS thread
    pub context_index: usize,
    /// Program being executed
    pub program: Arc<Program>,
    /// Index of the innermost stack frame
    pub stack_frame_index: usize,
    /// Instruction about to execute
    pub instruction: usize,
}

impl InstructionLocation {
    /// Source range of the instruction in the selected debug table
    pub fn source_range(&self, before_codegen: bool) -> Option<TextRange> {
        self.program
            .debug_info(before_codegen)?
            .range(self.instruction)
            .copied()
    }

    fn source_line(&self, before_codegen: bool) -> Option<(usize, usize)> {
        self.source_range(before_codegen)
            .map(|range| (range.code_index, range.row()))
    }

    fn depth_cmp(&self, other: &InstructionLocation) -> Ordering {
        (self.context_index, self.stack_frame_index)
            .cmp(&(other.context_index, other.stack_frame_index))
    }

    fn left_line(&self, current: &InstructionLocation, before_codegen: bool) -> bool {
        match current.source_line(before_codegen) {
            Some(line) => {
                !Arc::ptr_eq(&self.program, &current.program)
                    || Some(line) != self.source_line(before_codegen)
            }
            None => false,
        }
    }

    /// Whether a step over started here ends at `current`.
    ///
    /// Deeper frames never end the step. Shallower frames end it at the
    /// first mapped instruction; the starting frame ends it on another row.
    pub fn break_step_over(&self, current: &InstructionLocation, before_codegen: bool) -> bool {
        if current.thread != self.thread {
            return false;
        }
        match current.depth_cmp(self) {
            Ordering::Greater => false,
            Ordering::Less => current.source_line(before_codegen).is_some(),
            Ordering::Equal => self.left_line(current, before_codegen),
        }
    }

    /// Whether a step into started here ends at `current`.
    ///
    /// Like [`break_step_over`](Self::break_step_over), but a deeper frame
    /// ends the step at its first mapped instruction.
    pub fn break_step_into(&self, current: &InstructionLocation, before_codegen: bool) -> bool {
        if current.thread != self.thread {
            return false;
        }
        match current.depth_cmp(self) {
            Ordering::Equal => self.left_line(current, before_codegen),
            _ => current.source_line(before_codegen).is_some(),
        }
    }
}
