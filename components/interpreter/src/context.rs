//! Thread context
//!
//! A [`ThreadContext`] owns the operand stack, the stack frames and the trap
//! frames of one script execution. The operations here maintain the frame
//! bookkeeping; instruction dispatch lives in [`crate::dispatch`].

use crate::config::ThreadContextConfig;
use crate::debug_hook::DebuggerCallback;
use crate::error::ThreadContextError;
use crate::exception::{CallStackInfo, ExceptionInfo};
use crate::frame::{StackFrame, TrapFrame};
use crate::global::GlobalContext;
use crate::variable::VariableContext;
use bytecode_system::Program;
use core_types::{HandleId, Value};
use std::sync::Arc;
use tracing::{debug, trace};

/// Message of the fatal exception raised when the debugger stops a thread.
pub const STOPPED_BY_DEBUGGER: &str = "execution stopped by the debugger";

/// Lifecycle of a thread context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Created, no frame pushed yet
    Ready,
    /// Has frames to execute
    Executing,
    /// An exception is pending or escaped every frame
    RaisedException,
    /// The outermost frame returned
    Finished,
    /// A fatal exception unwound every frame
    FatalError,
}

/// What a single [`ThreadContext::execute`] step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionAction {
    /// Executed an ordinary instruction
    ExecuteInstruction,
    /// Unwound frames towards a handler, or out of the context
    UnwrapStack,
    /// Pushed a stack frame
    EnterStackFrame,
    /// Popped a stack frame
    ExitStackFrame,
    /// Nothing to do
    Nop,
}

/// Execution state of one script thread.
///
/// # Examples
///
/// ```
/// use bytecode_system::{Instruction, ProgramBuilder};
/// use core_types::Value;
/// use interpreter::{ExecutionStatus, ThreadContext};
/// use std::sync::Arc;
///
/// let mut builder = ProgramBuilder::new();
/// builder.begin_function("answer", &[], &[]).unwrap();
/// builder.emit(Instruction::LoadValue(Value::I32(42)));
/// builder.emit(Instruction::Return);
/// builder.end_function().unwrap();
///
/// let mut context = ThreadContext::new(Arc::new(builder.build().unwrap()));
/// context.push_stack_frame(0, 0, None).unwrap();
/// assert_eq!(context.execute_to_end(), ExecutionStatus::Finished);
/// assert_eq!(context.pop_value().unwrap(), Value::I32(42));
/// ```
#[derive(Debug)]
pub struct ThreadContext {
    id: HandleId,
    global: Arc<GlobalContext>,
    config: ThreadContextConfig,
    pub(crate) stack: Vec<Value>,
    pub(crate) frames: Vec<StackFrame>,
    pub(crate) trap_frames: Vec<TrapFrame>,
    pub(crate) exception: Option<Arc<ExceptionInfo>>,
    pub(crate) status: ExecutionStatus,
}

impl ThreadContext {
    /// Create a context with a fresh global context for `program`
    pub fn new(program: Arc<Program>) -> Self {
        Self::with_global(Arc::new(GlobalContext::new(program)))
    }

    /// Create a context executing against an existing global context
    pub fn with_global(global: Arc<GlobalContext>) -> Self {
        Self::with_config(global, ThreadContextConfig::default())
    }

    /// Create a context with explicit limits
    pub fn with_config(global: Arc<GlobalContext>, config: ThreadContextConfig) -> Self {
        Self {
            id: HandleId::next(),
            global,
            config,
            stack: Vec::with_capacity(config.stack_capacity),
            frames: Vec::new(),
            trap_frames: Vec::new(),
            exception: None,
            status: ExecutionStatus::Ready,
        }
    }

    /// Identity of this context
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The shared global context
    pub fn global(&self) -> &Arc<GlobalContext> {
        &self.global
    }

    /// The executed program
    pub fn program(&self) -> &Arc<Program> {
        self.global.program()
    }

    /// Limits of this context
    pub fn config(&self) -> &ThreadContextConfig {
        &self.config
    }

    /// Current status
    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// The pending or last raised exception
    pub fn exception(&self) -> Option<&Arc<ExceptionInfo>> {
        self.exception.as_ref()
    }

    /// The operand stack, bottom first
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// The stack frames, outermost first
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// The trap frames, outermost first
    pub fn trap_frames(&self) -> &[TrapFrame] {
        &self.trap_frames
    }

    /// The innermost stack frame
    pub fn current_frame(&self) -> Result<&StackFrame, ThreadContextError> {
        self.frames.last().ok_or(ThreadContextError::EmptyStackFrame)
    }

    pub(crate) fn current_frame_mut(&mut self) -> Result<&mut StackFrame, ThreadContextError> {
        self.frames
            .last_mut()
            .ok_or(ThreadContextError::EmptyStackFrame)
    }

    /// The innermost trap frame
    pub fn current_trap_frame(&self) -> Result<&TrapFrame, ThreadContextError> {
        self.trap_frames
            .last()
            .ok_or(ThreadContextError::EmptyTrapFrame)
    }

    /// Call `function`, taking its `argument_count` arguments from the top of
    /// the operand stack.
    ///
    /// Local variable slots are appended after the arguments and set to
    /// null. A context in `Ready` or `Finished` state becomes `Executing`, as
    /// does an idle context left by an escaped non-fatal exception.
    pub fn push_stack_frame(
        &mut self,
        function: usize,
        argument_count: usize,
        captured: Option<Arc<VariableContext>>,
    ) -> Result<(), ThreadContextError> {
        let floor = self.frames.last().map(|f| f.free_stack_base).unwrap_or(0);
        if self.stack.len() < floor {
            return Err(ThreadContextError::StackCorrupted);
        }
        let descriptor = self
            .program()
            .function(function)
            .ok_or(ThreadContextError::WrongFunctionIndex)?;
        if descriptor.argument_names.len() != argument_count {
            return Err(ThreadContextError::WrongArgumentCount);
        }
        let captured_count = captured.as_ref().map(|c| c.len()).unwrap_or(0);
        if descriptor.captured_variable_names.len() != captured_count {
            return Err(ThreadContextError::WrongCapturedVariableCount);
        }
        if self.stack.len() < floor + argument_count {
            return Err(ThreadContextError::StackCorrupted);
        }
        let stack_base = self.stack.len() - argument_count;
        let fixed_variable_count = descriptor.fixed_variable_count();
        let frame = StackFrame {
            captured,
            function_index: function,
            next_instruction: descriptor.first_instruction,
            stack_base,
            fixed_variable_count,
            free_stack_base: stack_base + fixed_variable_count,
        };
        trace!(
            context = %self.id,
            function = %descriptor.name,
            depth = self.frames.len() + 1,
            "enter stack frame"
        );
        self.stack
            .resize(stack_base + fixed_variable_count, Value::Null);
        let idle = self.frames.is_empty();
        self.frames.push(frame);
        match self.status {
            ExecutionStatus::Ready | ExecutionStatus::Finished => {
                self.status = ExecutionStatus::Executing;
            }
            // an escaped non-fatal exception leaves the context reusable
            ExecutionStatus::RaisedException if idle => {
                self.exception = None;
                self.status = ExecutionStatus::Executing;
            }
            _ => {}
        }
        Ok(())
    }

    /// Leave the innermost stack frame, discarding its stack region.
    ///
    /// Fails with `TrapFrameCorrupted` while the frame still owns a trap frame.
    pub fn pop_stack_frame(&mut self) -> Result<(), ThreadContextError> {
        let index = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or(ThreadContextError::EmptyStackFrame)?;
        if let Some(trap) = self.trap_frames.last() {
            if trap.stack_frame_index == index {
                return Err(ThreadContextError::TrapFrameCorrupted);
            }
        }
        if let Some(frame) = self.frames.pop() {
            self.stack.truncate(frame.stack_base);
            trace!(context = %self.id, depth = index, "exit stack frame");
        }
        Ok(())
    }

    /// Install a handler for the innermost stack frame
    pub fn push_trap_frame(&mut self, handler: usize) -> Result<(), ThreadContextError> {
        let stack_frame_index = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or(ThreadContextError::EmptyStackFrame)?;
        self.trap_frames.push(TrapFrame {
            stack_frame_index,
            handler,
            stack_height: self.stack.len(),
        });
        Ok(())
    }

    /// Remove the innermost trap frame.
    ///
    /// The trap frame must belong to the innermost stack frame and exactly
    /// `keep_count` values must have been left above its recorded height.
    pub fn pop_trap_frame(&mut self, keep_count: usize) -> Result<(), ThreadContextError> {
        let trap = *self.current_trap_frame()?;
        if Some(trap.stack_frame_index) != self.frames.len().checked_sub(1) {
            return Err(ThreadContextError::TrapFrameCorrupted);
        }
        if self.stack.len() != trap.stack_height + keep_count {
            return Err(ThreadContextError::StackCorrupted);
        }
        self.trap_frames.pop();
        Ok(())
    }

    /// Push a value onto the operand stack
    pub fn push_value(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop a value from the operand stack.
    ///
    /// While a frame is active, values at or below its free stack base are
    /// not poppable.
    pub fn pop_value(&mut self) -> Result<Value, ThreadContextError> {
        if let Some(frame) = self.frames.last() {
            if self.stack.len() <= frame.free_stack_base {
                return Err(ThreadContextError::StackCorrupted);
            }
        }
        self.stack.pop().ok_or(ThreadContextError::EmptyStack)
    }

    /// Read a scratch value of the innermost frame by absolute stack index
    pub fn load_stack_value(&self, index: usize) -> Result<Value, ThreadContextError> {
        let floor = self.frames.last().map(|f| f.free_stack_base).unwrap_or(0);
        if index < floor {
            return Err(ThreadContextError::WrongStackItemIndex);
        }
        self.stack
            .get(index)
            .cloned()
            .ok_or(ThreadContextError::WrongStackItemIndex)
    }

    /// Read a global variable
    pub fn load_global_variable(&self, index: usize) -> Result<Value, ThreadContextError> {
        self.global
            .globals()
            .get(index)
            .ok_or(ThreadContextError::WrongGlobalVariableIndex)
    }

    /// Write a global variable
    pub fn store_global_variable(
        &self,
        index: usize,
        value: Value,
    ) -> Result<(), ThreadContextError> {
        if self.global.globals().set(index, value) {
            Ok(())
        } else {
            Err(ThreadContextError::WrongGlobalVariableIndex)
        }
    }

    /// Read a captured variable of the innermost frame
    pub fn load_captured_variable(&self, index: usize) -> Result<Value, ThreadContextError> {
        self.current_frame()?
            .captured
            .as_ref()
            .and_then(|captured| captured.get(index))
            .ok_or(ThreadContextError::WrongCapturedVariableIndex)
    }

    /// Read an argument or local variable of the innermost frame
    pub fn load_local_variable(&self, index: usize) -> Result<Value, ThreadContextError> {
        let slot = self.local_slot(index)?;
        self.stack
            .get(slot)
            .cloned()
            .ok_or(ThreadContextError::StackCorrupted)
    }

    /// Write an argument or local variable of the innermost frame
    pub fn store_local_variable(
        &mut self,
        index: usize,
        value: Value,
    ) -> Result<(), ThreadContextError> {
        let slot = self.local_slot(index)?;
        let target = self
            .stack
            .get_mut(slot)
            .ok_or(ThreadContextError::StackCorrupted)?;
        *target = value;
        Ok(())
    }

    fn local_slot(&self, index: usize) -> Result<usize, ThreadContextError> {
        let frame = self.current_frame()?;
        if index >= frame.fixed_variable_count {
            return Err(ThreadContextError::WrongLocalVariableIndex);
        }
        Ok(frame.stack_base + index)
    }

    /// Snapshot of every active frame, innermost first
    pub fn call_stack(&self) -> Vec<Arc<CallStackInfo>> {
        self.frames
            .iter()
            .rev()
            .map(|frame| Arc::new(CallStackInfo::capture(self, frame)))
            .collect()
    }

    /// Raise an exception.
    ///
    /// The status becomes `RaisedException`; the next [`execute`] step
    /// unwinds. The debugger, when given, may pause the thread here. If it
    /// stops the program instead, a fatal exception replaces this one.
    ///
    /// [`execute`]: ThreadContext::execute
    pub fn raise_exception(
        &mut self,
        info: Arc<ExceptionInfo>,
        debugger: Option<&dyn DebuggerCallback>,
    ) {
        debug!(
            context = %self.id,
            message = info.message(),
            fatal = info.is_fatal(),
            "exception raised"
        );
        self.exception = Some(info.clone());
        self.status = ExecutionStatus::RaisedException;
        if let Some(debugger) = debugger {
            if debugger.break_exception(self, &info) && !debugger.wait_for_continue() {
                self.raise_message(STOPPED_BY_DEBUGGER, true, None);
            }
        }
    }

    /// Raise an exception with the given message and the current call stack
    pub fn raise_message(
        &mut self,
        message: impl Into<String>,
        fatal: bool,
        debugger: Option<&dyn DebuggerCallback>,
    ) {
        let info = ExceptionInfo::new(message, fatal).with_call_stack(self.call_stack());
        self.raise_exception(Arc::new(info), debugger);
    }
}
