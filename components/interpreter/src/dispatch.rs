//! Instruction dispatch
//!
//! [`ThreadContext::execute`] runs one step: an instruction, or one unwind
//! towards the nearest handler. Failures inside an instruction are
//! collected as a [`Fault`] and turned into a raised exception, so the
//! dispatcher never returns an error to the host.

use crate::context::{ExecutionAction, ExecutionStatus, ThreadContext, STOPPED_BY_DEBUGGER};
use crate::debug_hook::{current_debugger, DebuggerCallback};
use crate::error::ThreadContextError;
use crate::exception::ExceptionInfo;
use crate::function::ScriptFunction;
use crate::interface::InterfaceProxy;
use crate::operators;
use crate::variable::VariableContext;
use bytecode_system::{InsCode, Instruction};
use core_types::{
    builtin_type, type_of, Accessor, HandleId, ObjectRef, RangeValue, Value, ValueError,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Why an instruction did not complete.
#[derive(Debug)]
pub(crate) enum Fault {
    /// Frame bookkeeping failed; always fatal
    Internal(ThreadContextError),
    /// A value operation or a reflected member failed
    Script(ValueError),
    /// A script raised a plain message
    Message(String),
    /// A script raised an exception object
    Rethrow(Arc<ExceptionInfo>),
    /// The debugger stopped the program while the thread was paused
    Stopped,
}

impl From<ThreadContextError> for Fault {
    fn from(error: ThreadContextError) -> Self {
        Fault::Internal(error)
    }
}

impl From<ValueError> for Fault {
    fn from(error: ValueError) -> Self {
        Fault::Script(error)
    }
}

type Step = Result<ExecutionAction, Fault>;

fn object_handle(value: &Value) -> Option<HandleId> {
    value.as_object().map(|object| object.object_id())
}

/// Let the debugger pause before a member access or variable access.
fn pause_if(
    debugger: Option<&dyn DebuggerCallback>,
    hit: impl FnOnce(&dyn DebuggerCallback) -> bool,
) -> Result<(), Fault> {
    match debugger {
        Some(debugger) if hit(debugger) && !debugger.wait_for_continue() => Err(Fault::Stopped),
        _ => Ok(()),
    }
}

fn mismatch(expected: &'static str, found: &Value) -> Fault {
    Fault::Script(ValueError::TypeMismatch {
        expected,
        found: found.value_type(),
    })
}

impl ThreadContext {
    /// Run one step.
    ///
    /// While executing, the instruction at the innermost frame's
    /// `next_instruction` runs after the debugger had a chance to pause
    /// before it. With an exception pending, frames are unwound to the
    /// nearest trap frame or out of the context.
    pub fn execute(&mut self, debugger: Option<&dyn DebuggerCallback>) -> ExecutionAction {
        match self.status {
            ExecutionStatus::Executing => self.execute_next(debugger),
            ExecutionStatus::RaisedException if !self.frames.is_empty() => self.unwind(),
            _ => ExecutionAction::Nop,
        }
    }

    /// Step until the context finishes or an exception escapes it.
    ///
    /// The debugger attached to the calling OS thread, if any, observes the
    /// whole run.
    pub fn execute_to_end(&mut self) -> ExecutionStatus {
        let debugger = current_debugger();
        let debugger = debugger.as_deref();
        if let Some(debugger) = debugger {
            debugger.enter_thread_context(self);
        }
        loop {
            match self.status {
                ExecutionStatus::Executing => {}
                ExecutionStatus::RaisedException if !self.frames.is_empty() => {}
                _ => break,
            }
            self.execute(debugger);
        }
        if let Some(debugger) = debugger {
            debugger.leave_thread_context(self);
        }
        self.status
    }

    fn execute_next(&mut self, debugger: Option<&dyn DebuggerCallback>) -> ExecutionAction {
        let Some(frame) = self.frames.last_mut() else {
            self.status = ExecutionStatus::Finished;
            return ExecutionAction::Nop;
        };
        let index = frame.next_instruction;
        frame.next_instruction += 1;

        let program = self.program().clone();
        let Some(instruction) = program.instructions.get(index) else {
            self.raise_message(
                format!("internal error: instruction {} does not exist", index),
                true,
                None,
            );
            return ExecutionAction::Nop;
        };

        if let Some(debugger) = debugger {
            if debugger.break_instruction(self, index) && !debugger.wait_for_continue() {
                self.raise_message(STOPPED_BY_DEBUGGER, true, None);
                return ExecutionAction::Nop;
            }
        }

        trace!(context = %self.id(), index, code = %instruction.code(), "execute");
        match self.execute_instruction(instruction, debugger) {
            Ok(action) => action,
            Err(fault) => {
                self.raise_fault(fault, instruction.code(), debugger);
                ExecutionAction::ExecuteInstruction
            }
        }
    }

    fn raise_fault(
        &mut self,
        fault: Fault,
        code: InsCode,
        debugger: Option<&dyn DebuggerCallback>,
    ) {
        match fault {
            Fault::Internal(error) => {
                warn!(context = %self.id(), %code, %error, "internal error");
                let message = format!("internal error in {}: {}", code, error);
                self.raise_message(message, true, debugger);
            }
            Fault::Script(ValueError::Raised {
                message,
                fatal,
                exception,
            }) => match exception.as_ref().and_then(ExceptionInfo::from_object) {
                // already reported by the nested context
                Some(info) => self.raise_exception(info, None),
                None => self.raise_message(message, fatal, debugger),
            },
            Fault::Script(error) => {
                let fatal = error.is_fatal();
                self.raise_message(error.to_string(), fatal, debugger);
            }
            Fault::Message(message) => self.raise_message(message, false, debugger),
            Fault::Rethrow(info) => self.raise_exception(info, debugger),
            Fault::Stopped => self.raise_message(STOPPED_BY_DEBUGGER, true, None),
        }
    }

    fn unwind(&mut self) -> ExecutionAction {
        let fatal = self.exception.as_ref().map_or(true, |e| e.is_fatal());
        if !fatal {
            while let Some(trap) = self.trap_frames.last() {
                if trap.stack_frame_index < self.frames.len() {
                    break;
                }
                self.trap_frames.pop();
            }
            if let Some(trap) = self.trap_frames.pop() {
                self.frames.truncate(trap.stack_frame_index + 1);
                self.stack.truncate(trap.stack_height);
                if let Some(frame) = self.frames.last_mut() {
                    frame.next_instruction = trap.handler;
                }
                debug!(
                    context = %self.id(),
                    handler = trap.handler,
                    depth = self.frames.len(),
                    "exception handled"
                );
                self.status = ExecutionStatus::Executing;
                return ExecutionAction::UnwrapStack;
            }
        }
        debug!(context = %self.id(), fatal, "exception escaped every frame");
        self.frames.clear();
        self.trap_frames.clear();
        self.stack.clear();
        if fatal {
            self.status = ExecutionStatus::FatalError;
        }
        ExecutionAction::UnwrapStack
    }

    fn pop_arguments(&mut self, count: usize) -> Result<Vec<Value>, Fault> {
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(self.pop_value()?);
        }
        args.reverse();
        Ok(args)
    }

    fn execute_instruction(
        &mut self,
        instruction: &Instruction,
        debugger: Option<&dyn DebuggerCallback>,
    ) -> Step {
        use ExecutionAction::ExecuteInstruction as Next;

        match instruction {
            Instruction::Nop => {}
            Instruction::LoadValue(value) => self.push_value(value.clone()),
            Instruction::LoadClosure { function, count } => {
                if self.program().function(*function).is_none() {
                    return Err(ThreadContextError::WrongFunctionIndex.into());
                }
                let captured = self.pop_arguments(*count)?;
                let closure = ScriptFunction::closure(
                    self.global().clone(),
                    Arc::new(VariableContext::from_values(captured)),
                    *function,
                );
                self.push_value(Value::Function(Arc::new(closure)));
            }
            Instruction::LoadException => {
                let value = self
                    .exception
                    .as_ref()
                    .map_or(Value::Null, ExceptionInfo::to_value);
                self.push_value(value);
            }
            Instruction::LoadLocalVar(index) => {
                let value = self.load_local_variable(*index)?;
                self.push_value(value);
            }
            Instruction::LoadCapturedVar(index) => {
                let value = self.load_captured_variable(*index)?;
                self.push_value(value);
            }
            Instruction::LoadGlobalVar(index) => {
                pause_if(debugger, |d| d.break_read(self, *index))?;
                let value = self.load_global_variable(*index)?;
                self.push_value(value);
            }
            Instruction::StoreLocalVar(index) => {
                let value = self.pop_value()?;
                self.store_local_variable(*index, value)?;
            }
            Instruction::StoreGlobalVar(index) => {
                pause_if(debugger, |d| d.break_write(self, *index))?;
                let value = self.pop_value()?;
                self.store_global_variable(*index, value)?;
            }
            Instruction::Duplicate(count) => {
                let index = self
                    .stack
                    .len()
                    .checked_sub(count + 1)
                    .ok_or(ThreadContextError::WrongStackItemIndex)?;
                let value = self.load_stack_value(index)?;
                self.push_value(value);
            }
            Instruction::Pop => {
                self.pop_value()?;
            }
            Instruction::Return => {
                let value = self.pop_value()?;
                self.pop_stack_frame()?;
                if self.frames.is_empty() {
                    self.status = ExecutionStatus::Finished;
                }
                self.push_value(value);
                return Ok(ExecutionAction::ExitStackFrame);
            }
            Instruction::CreateArray(count) => {
                let mut items = Vec::with_capacity(*count);
                for _ in 0..*count {
                    items.push(self.pop_value()?);
                }
                self.push_value(Value::new_list(items));
            }
            Instruction::CreateMap(count) => {
                if count % 2 != 0 {
                    return Err(ThreadContextError::StackCorrupted.into());
                }
                let mut entries: Vec<(Value, Value)> = Vec::with_capacity(count / 2);
                for _ in 0..count / 2 {
                    let value = self.pop_value()?;
                    let key = self.pop_value()?;
                    // popped last-written first
                    if !entries.iter().any(|(k, _)| k.loose_eq(&key)) {
                        entries.push((key, value));
                    }
                }
                self.push_value(Value::new_map(entries));
            }
            Instruction::CreateInterface(count) => {
                if count % 2 != 0 {
                    return Err(ThreadContextError::StackCorrupted.into());
                }
                let mut methods = Vec::with_capacity(count / 2);
                for _ in 0..count / 2 {
                    let function = match self.pop_value()? {
                        Value::Function(function) => function,
                        other => return Err(mismatch("function", &other)),
                    };
                    let name = self.pop_value()?;
                    let name = name
                        .as_str()
                        .ok_or_else(|| mismatch("method name", &name))?
                        .to_string();
                    methods.push((name, function));
                }
                let proxy: ObjectRef = Arc::new(InterfaceProxy::new(methods));
                self.push_value(Value::Object(proxy));
            }
            Instruction::CreateRange(ty) => {
                let element = ty
                    .value_type()
                    .filter(|tag| tag.is_integer())
                    .ok_or_else(|| {
                        ValueError::InvalidOperation(format!("range of {:?}", ty))
                    })?;
                let end = self.pop_value()?;
                let begin = self.pop_value()?;
                let element_type = builtin_type(element);
                let begin = element_type.convert(&begin)?.as_i128().unwrap_or_default();
                let end = element_type.convert(&end)?.as_i128().unwrap_or_default();
                self.push_value(Value::Range(RangeValue {
                    begin,
                    end,
                    element,
                    reversed: false,
                }));
            }
            Instruction::ReverseEnumerable => {
                let value = match self.pop_value()? {
                    Value::List(items) => {
                        let mut reversed = items.read().clone();
                        reversed.reverse();
                        Value::new_list(reversed)
                    }
                    Value::Range(range) => Value::Range(RangeValue {
                        reversed: !range.reversed,
                        ..range
                    }),
                    other => return Err(mismatch("enumerable", &other)),
                };
                self.push_value(value);
            }
            Instruction::DeleteRawPtr => match self.pop_value()? {
                Value::Object(object) => object.dispose()?,
                Value::Null => {
                    return Err(ValueError::NullReference("DeleteRawPtr".to_string()).into())
                }
                other => return Err(mismatch("object", &other)),
            },
            Instruction::ConvertToType(ty) => {
                let value = self.pop_value()?;
                let converted = ty.convert(&value)?;
                self.push_value(converted);
            }
            Instruction::TryConvertToType(ty) => {
                let value = self.pop_value()?;
                self.push_value(ty.convert(&value).unwrap_or(Value::Null));
            }
            Instruction::TestType(ty) => {
                let value = self.pop_value()?;
                self.push_value(Value::Bool(ty.test(&value)));
            }
            Instruction::GetType => {
                let value = self.pop_value()?;
                self.push_value(Value::Type(type_of(&value)));
            }
            Instruction::Jump(label) => {
                self.current_frame_mut()?.next_instruction = *label;
            }
            Instruction::JumpIf(label) => {
                let condition = self.pop_value()?;
                if condition
                    .as_bool()
                    .ok_or_else(|| mismatch("boolean condition", &condition))?
                {
                    self.current_frame_mut()?.next_instruction = *label;
                }
            }
            Instruction::Invoke { function, count } => {
                if self.frames.len() >= self.config().max_call_depth {
                    return Err(Fault::Message("call stack overflow".to_string()));
                }
                self.push_stack_frame(*function, *count, None)?;
                return Ok(ExecutionAction::EnterStackFrame);
            }
            Instruction::GetProperty(property) => {
                let this = self.pop_value()?;
                if this.is_null() {
                    return Err(ValueError::NullReference(property.name().to_string()).into());
                }
                pause_if(debugger, |d| d.break_get(self, object_handle(&this), property))?;
                let value = property.get(&this)?;
                self.push_value(value);
            }
            Instruction::InvokeProxy(count) => {
                let function = self.pop_value()?;
                let args = self.pop_arguments(*count)?;
                let result = match function {
                    Value::Function(function) => function.invoke(args)?,
                    Value::Null => {
                        return Err(ValueError::NullReference("function call".to_string()).into())
                    }
                    other => return Err(mismatch("function", &other)),
                };
                self.push_value(result);
            }
            Instruction::InvokeMethod { method, count } => {
                let this = self.pop_value()?;
                let args = self.pop_arguments(*count)?;
                let receiver = !(method.is_static() || method.is_constructor());
                if receiver && this.is_null() {
                    return Err(ValueError::NullReference(method.name().to_string()).into());
                }
                let handle = object_handle(&this);
                pause_if(debugger, |d| match method.owner_property() {
                    Some((property, Accessor::Getter)) => d.break_get(self, handle, &property),
                    Some((property, Accessor::Setter)) => d.break_set(self, handle, &property),
                    None => match method.owner_type() {
                        Some(ty) if method.is_constructor() => d.break_create(self, &ty),
                        _ => d.break_invoke(self, handle, method),
                    },
                })?;
                let result = method.invoke(receiver.then_some(&this), args)?;
                self.push_value(result);
            }
            Instruction::AttachEvent(event) => {
                let handler = self.pop_value()?;
                let this = self.pop_value()?;
                pause_if(debugger, |d| d.break_attach(self, object_handle(&this), event))?;
                let listener = event.attach(&this, handler)?;
                self.push_value(listener);
            }
            Instruction::DetachEvent(event) => {
                let listener = self.pop_value()?;
                let this = self.pop_value()?;
                pause_if(debugger, |d| d.break_detach(self, object_handle(&this), event))?;
                let detached = event.detach(&this, &listener)?;
                self.push_value(Value::Bool(detached));
            }
            Instruction::InstallTry(label) => self.push_trap_frame(*label)?,
            Instruction::UninstallTry(count) => self.pop_trap_frame(*count)?,
            Instruction::RaiseException => {
                let value = self.pop_value()?;
                return Err(match ExceptionInfo::from_value(&value) {
                    Some(info) => Fault::Rethrow(info),
                    None => match value.as_str() {
                        Some(message) => Fault::Message(message.to_string()),
                        None => Fault::Message(value.to_string()),
                    },
                });
            }
            Instruction::TestElementInSet => {
                let set = self.pop_value()?;
                let element = self.pop_value()?;
                let found = match &set {
                    Value::List(items) => items.read().iter().any(|item| item.loose_eq(&element)),
                    Value::Map(entries) => {
                        entries.read().iter().any(|(key, _)| key.loose_eq(&element))
                    }
                    Value::Range(range) => element
                        .as_i128()
                        .map_or(false, |item| range.contains(item)),
                    other => return Err(mismatch("list, map or range", other)),
                };
                self.push_value(Value::Bool(found));
            }
            Instruction::CompareLiteral(ty) => {
                let right = self.pop_value()?;
                let left = self.pop_value()?;
                self.push_value(operators::compare_literal(*ty, &left, &right)?);
            }
            Instruction::CompareStruct => {
                let right = self.pop_value()?;
                let left = self.pop_value()?;
                self.push_value(Value::Bool(left == right));
            }
            Instruction::CompareReference => {
                let right = self.pop_value()?;
                let left = self.pop_value()?;
                self.push_value(Value::Bool(left.same_reference(&right)));
            }
            Instruction::CompareValue => {
                let right = self.pop_value()?;
                let left = self.pop_value()?;
                self.push_value(Value::Bool(left.loose_eq(&right)));
            }
            Instruction::OpNot(ty) | Instruction::OpPositive(ty) | Instruction::OpNegative(ty) => {
                let operand = self.pop_value()?;
                self.push_value(operators::unary(instruction.code(), *ty, &operand)?);
            }
            Instruction::OpConcat => {
                let right = self.pop_value()?;
                let left = self.pop_value()?;
                self.push_value(operators::concat(&left, &right)?);
            }
            Instruction::OpExp(ty)
            | Instruction::OpAdd(ty)
            | Instruction::OpSub(ty)
            | Instruction::OpMul(ty)
            | Instruction::OpDiv(ty)
            | Instruction::OpMod(ty)
            | Instruction::OpShl(ty)
            | Instruction::OpShr(ty)
            | Instruction::OpXor(ty)
            | Instruction::OpAnd(ty)
            | Instruction::OpOr(ty) => {
                let right = self.pop_value()?;
                let left = self.pop_value()?;
                self.push_value(operators::binary(instruction.code(), *ty, &left, &right)?);
            }
            Instruction::OpLT
            | Instruction::OpGT
            | Instruction::OpLE
            | Instruction::OpGE
            | Instruction::OpEQ
            | Instruction::OpNE => {
                let result = self.pop_value()?;
                let test = operators::test_compare_result(instruction.code(), &result)?;
                self.push_value(Value::Bool(test));
            }
        }
        Ok(Next)
    }
}
