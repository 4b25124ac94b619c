//! Script functions callable from the host
//!
//! [`load_function`] resolves a function by name; closures created by
//! `LoadClosure` are [`ScriptFunction`]s too. Each call runs in a fresh
//! [`ThreadContext`] on the calling OS thread.

use crate::context::{ExecutionStatus, ThreadContext};
use crate::error::{LoadFunctionError, ThreadContextError};
use crate::exception::{ExceptionInfo, RuntimeException};
use crate::global::{GlobalContext, INITIALIZE_FUNCTION};
use crate::variable::VariableContext;
use core_types::{Callable, HandleId, Value, ValueError, ValueResult};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// A compiled function bound to a global context.
#[derive(Debug)]
pub struct ScriptFunction {
    id: HandleId,
    global: Arc<GlobalContext>,
    captured: Option<Arc<VariableContext>>,
    function_index: usize,
    entry: bool,
}

impl ScriptFunction {
    pub(crate) fn closure(
        global: Arc<GlobalContext>,
        captured: Arc<VariableContext>,
        function_index: usize,
    ) -> Self {
        Self {
            id: HandleId::next(),
            global,
            captured: Some(captured),
            function_index,
            entry: false,
        }
    }

    /// Index of the function in its program
    pub fn function_index(&self) -> usize {
        self.function_index
    }

    /// The global context the function runs against
    pub fn global(&self) -> &Arc<GlobalContext> {
        &self.global
    }

    /// Run the function to completion in a new thread context.
    ///
    /// An exception escaping the function is returned as a
    /// [`RuntimeException`] carrying the call stack.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, RuntimeException> {
        let name = self.name().to_string();
        if self.entry {
            if name == INITIALIZE_FUNCTION {
                self.global.mark_initialized();
            } else if !self.global.is_initialized() {
                return Err(fail(format!(
                    "global context not initialized: {} must run before {}",
                    INITIALIZE_FUNCTION, name
                )));
            }
        }
        let mut context = ThreadContext::with_global(self.global.clone());
        let argument_count = args.len();
        for arg in args {
            context.push_value(arg);
        }
        if let Err(error) =
            context.push_stack_frame(self.function_index, argument_count, self.captured.clone())
        {
            let message = match error {
                ThreadContextError::WrongArgumentCount => format!(
                    "{} expects {} arguments, received {}",
                    name,
                    self.expected_arguments(),
                    argument_count
                ),
                other => format!("cannot call {}: {}", name, other),
            };
            return Err(fail(message));
        }
        match context.execute_to_end() {
            ExecutionStatus::Finished => context
                .pop_value()
                .map_err(|error| fail(format!("{} returned no value: {}", name, error))),
            status => {
                debug!(function = %name, ?status, "script function failed");
                let info = context
                    .exception()
                    .cloned()
                    .unwrap_or_else(|| Arc::new(ExceptionInfo::new("execution aborted", true)));
                Err(RuntimeException::new(info))
            }
        }
    }

    fn expected_arguments(&self) -> usize {
        self.global
            .program()
            .function(self.function_index)
            .map(|function| function.argument_names.len())
            .unwrap_or(0)
    }
}

fn fail(message: String) -> RuntimeException {
    RuntimeException::new(Arc::new(ExceptionInfo::new(message, true)))
}

impl Callable for ScriptFunction {
    fn function_id(&self) -> HandleId {
        self.id
    }

    fn name(&self) -> &str {
        self.global
            .program()
            .function(self.function_index)
            .map(|function| function.name.as_str())
            .unwrap_or("")
    }

    fn invoke(&self, args: Vec<Value>) -> ValueResult<Value> {
        self.call(args).map_err(ValueError::from)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Find the unique function called `name` and bind it to `global`.
///
/// The function takes no captured variables. If the program has an
/// `<initialize>` function, it must be called before any other function
/// loaded this way.
///
/// # Examples
///
/// ```
/// use bytecode_system::{Instruction, ProgramBuilder};
/// use core_types::Value;
/// use interpreter::{load_function, GlobalContext};
/// use std::sync::Arc;
///
/// let mut builder = ProgramBuilder::new();
/// builder.begin_function("id", &["x"], &[]).unwrap();
/// builder.emit(Instruction::LoadLocalVar(0));
/// builder.emit(Instruction::Return);
/// builder.end_function().unwrap();
///
/// let global = Arc::new(GlobalContext::new(Arc::new(builder.build().unwrap())));
/// let id = load_function(&global, "id").unwrap();
/// assert_eq!(id.call(vec![Value::I32(3)]).unwrap(), Value::I32(3));
/// ```
pub fn load_function(
    global: &Arc<GlobalContext>,
    name: &str,
) -> Result<Arc<ScriptFunction>, LoadFunctionError> {
    let function_index = match global.program().functions_named(name) {
        [] => return Err(LoadFunctionError::NotFound(name.to_string())),
        [index] => *index,
        indexes => {
            return Err(LoadFunctionError::Ambiguous {
                name: name.to_string(),
                count: indexes.len(),
            })
        }
    };
    Ok(Arc::new(ScriptFunction {
        id: HandleId::next(),
        global: global.clone(),
        captured: None,
        function_index,
        entry: true,
    }))
}
