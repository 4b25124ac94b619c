//! Exceptions and call-stack snapshots
//!
//! A raised exception carries the call stack that was active when it was
//! raised, innermost frame first. Each [`CallStackInfo`] copies the
//! arguments and locals of its frame and shares the live global and
//! captured variable storage.

use crate::context::ThreadContext;
use crate::frame::StackFrame;
use crate::variable::VariableContext;
use bytecode_system::Program;
use core_types::{
    HandleId, ObjectRef, ReflectedObject, TextRange, TypeDescriptor, TypeRef, Value, ValueError,
};
use std::any::Any;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Names paired with values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableDictionary {
    entries: Vec<(String, Value)>,
}

impl VariableDictionary {
    /// Pair names with values. Surplus names or values are dropped.
    pub fn new(names: &[String], values: Vec<Value>) -> Self {
        Self {
            entries: names.iter().cloned().zip(values).collect(),
        }
    }

    /// Value of a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot of one stack frame.
///
/// The name dictionaries are built on first access and cached.
#[derive(Debug)]
pub struct CallStackInfo {
    program: Arc<Program>,
    globals: Arc<VariableContext>,
    captured: Option<Arc<VariableContext>>,
    arguments: Vec<Value>,
    locals: Vec<Value>,
    function_index: usize,
    instruction: usize,
    global_dictionary: OnceLock<Arc<VariableDictionary>>,
    captured_dictionary: OnceLock<Arc<VariableDictionary>>,
    argument_dictionary: OnceLock<Arc<VariableDictionary>>,
    local_dictionary: OnceLock<Arc<VariableDictionary>>,
}

impl CallStackInfo {
    /// Snapshot `frame` of `context`.
    pub fn capture(context: &ThreadContext, frame: &StackFrame) -> Self {
        let program = context.program().clone();
        let argument_count = program
            .function(frame.function_index)
            .map(|function| function.argument_names.len())
            .unwrap_or(0)
            .min(frame.fixed_variable_count);
        let stack = context.stack();
        let slice = |from: usize, to: usize| {
            stack
                .get(from..to)
                .map(<[Value]>::to_vec)
                .unwrap_or_default()
        };
        let arguments = slice(frame.stack_base, frame.stack_base + argument_count);
        let locals = slice(
            frame.stack_base + argument_count,
            frame.stack_base + frame.fixed_variable_count,
        );
        Self {
            globals: context.global().globals().clone(),
            captured: frame.captured.clone(),
            arguments,
            locals,
            function_index: frame.function_index,
            instruction: frame.next_instruction.saturating_sub(1),
            program,
            global_dictionary: OnceLock::new(),
            captured_dictionary: OnceLock::new(),
            argument_dictionary: OnceLock::new(),
            local_dictionary: OnceLock::new(),
        }
    }

    /// The executing program
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Index of the executing function
    pub fn function_index(&self) -> usize {
        self.function_index
    }

    /// Index of the instruction being executed
    pub fn instruction(&self) -> usize {
        self.instruction
    }

    /// Name of the executing function
    pub fn function_name(&self) -> &str {
        self.program
            .function(self.function_index)
            .map(|function| function.name.as_str())
            .unwrap_or("")
    }

    /// Source range of the executing instruction in the user's code
    pub fn source_range(&self) -> Option<TextRange> {
        self.program
            .debug_info(true)
            .and_then(|info| info.range(self.instruction))
            .copied()
    }

    /// Source of the module containing the executing instruction
    pub fn source_code(&self) -> Option<&str> {
        let range = self.source_range()?;
        self.program
            .debug_info(true)?
            .module_codes
            .get(range.code_index)
            .map(String::as_str)
    }

    /// Row of the executing instruction in the user's code
    pub fn row(&self) -> Option<usize> {
        self.source_range().map(|range| range.row())
    }

    /// Argument values at the time of the snapshot
    pub fn argument_values(&self) -> &[Value] {
        &self.arguments
    }

    /// Local variable values at the time of the snapshot
    pub fn local_values(&self) -> &[Value] {
        &self.locals
    }

    /// Current global variables by name
    pub fn global_variables(&self) -> Arc<VariableDictionary> {
        self.global_dictionary
            .get_or_init(|| {
                Arc::new(VariableDictionary::new(
                    &self.program.variable_names,
                    self.globals.to_vec(),
                ))
            })
            .clone()
    }

    /// Current captured variables by name
    pub fn captured_variables(&self) -> Arc<VariableDictionary> {
        self.captured_dictionary
            .get_or_init(|| {
                let values = self
                    .captured
                    .as_ref()
                    .map(|captured| captured.to_vec())
                    .unwrap_or_default();
                let names = self
                    .program
                    .function(self.function_index)
                    .map(|function| function.captured_variable_names.as_slice())
                    .unwrap_or(&[]);
                Arc::new(VariableDictionary::new(names, values))
            })
            .clone()
    }

    /// Arguments by name
    pub fn arguments(&self) -> Arc<VariableDictionary> {
        self.argument_dictionary
            .get_or_init(|| {
                let names = self
                    .program
                    .function(self.function_index)
                    .map(|function| function.argument_names.as_slice())
                    .unwrap_or(&[]);
                Arc::new(VariableDictionary::new(names, self.arguments.clone()))
            })
            .clone()
    }

    /// Local variables by name
    pub fn local_variables(&self) -> Arc<VariableDictionary> {
        self.local_dictionary
            .get_or_init(|| {
                let names = self
                    .program
                    .function(self.function_index)
                    .map(|function| function.local_variable_names.as_slice())
                    .unwrap_or(&[]);
                Arc::new(VariableDictionary::new(names, self.locals.clone()))
            })
            .clone()
    }
}

#[derive(Debug)]
struct ExceptionType {
    id: HandleId,
}

impl TypeDescriptor for ExceptionType {
    fn id(&self) -> HandleId {
        self.id
    }

    fn type_name(&self) -> &str {
        "system::Exception"
    }
}

/// Descriptor of [`ExceptionInfo`] objects.
pub fn exception_type() -> TypeRef {
    static TYPE: OnceLock<TypeRef> = OnceLock::new();
    TYPE.get_or_init(|| Arc::new(ExceptionType { id: HandleId::next() }))
        .clone()
}

/// A raised exception.
///
/// Exposed to scripts as an object through `LoadException`.
#[derive(Debug)]
pub struct ExceptionInfo {
    id: HandleId,
    message: String,
    fatal: bool,
    call_stack: Vec<Arc<CallStackInfo>>,
}

impl ExceptionInfo {
    /// Create an exception with an empty call stack
    pub fn new(message: impl Into<String>, fatal: bool) -> Self {
        Self {
            id: HandleId::next(),
            message: message.into(),
            fatal,
            call_stack: Vec::new(),
        }
    }

    /// Attach a call stack, innermost frame first
    pub fn with_call_stack(mut self, call_stack: Vec<Arc<CallStackInfo>>) -> Self {
        self.call_stack = call_stack;
        self
    }

    /// Exception message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the exception bypasses every handler
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Frames active when the exception was raised, innermost first
    pub fn call_stack(&self) -> &[Arc<CallStackInfo>] {
        &self.call_stack
    }

    /// Wrap into a script value
    pub fn to_value(self: &Arc<Self>) -> Value {
        Value::Object(self.clone() as ObjectRef)
    }

    /// Recover an exception from a script value
    pub fn from_value(value: &Value) -> Option<Arc<Self>> {
        Self::from_object(value.as_object()?)
    }

    /// Recover an exception from a reflected object
    pub fn from_object(object: &ObjectRef) -> Option<Arc<Self>> {
        object.clone().into_any().downcast::<Self>().ok()
    }
}

impl ReflectedObject for ExceptionInfo {
    fn object_id(&self) -> HandleId {
        self.id
    }

    fn type_descriptor(&self) -> TypeRef {
        exception_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Error returned to the host when a script execution fails.
#[derive(Debug, Clone, Error)]
#[error("{}{message}", fatal_prefix(.fatal))]
pub struct RuntimeException {
    message: String,
    fatal: bool,
    info: Arc<ExceptionInfo>,
}

impl RuntimeException {
    /// Wrap an exception
    pub fn new(info: Arc<ExceptionInfo>) -> Self {
        Self {
            message: info.message().to_string(),
            fatal: info.is_fatal(),
            info,
        }
    }

    /// Exception message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure was fatal
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// The exception with its call stack
    pub fn info(&self) -> &Arc<ExceptionInfo> {
        &self.info
    }
}

fn fatal_prefix(fatal: &bool) -> &'static str {
    if *fatal {
        "fatal: "
    } else {
        ""
    }
}

impl From<RuntimeException> for ValueError {
    fn from(exception: RuntimeException) -> Self {
        ValueError::Raised {
            message: exception.message,
            fatal: exception.fatal,
            exception: Some(exception.info as ObjectRef),
        }
    }
}
