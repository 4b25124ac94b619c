//! Program-wide state shared by thread contexts

use crate::variable::VariableContext;
use bytecode_system::Program;
use core_types::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Name of the function that initializes global variables.
pub const INITIALIZE_FUNCTION: &str = "<initialize>";

/// A program together with its global variables.
///
/// Several thread contexts may execute against the same global context.
#[derive(Debug)]
pub struct GlobalContext {
    program: Arc<Program>,
    globals: Arc<VariableContext>,
    initialized: AtomicBool,
}

impl GlobalContext {
    /// Create a global context with every global variable set to null.
    pub fn new(program: Arc<Program>) -> Self {
        let globals = Arc::new(VariableContext::new(program.variable_names.len()));
        let initialized = program.functions_named(INITIALIZE_FUNCTION).is_empty();
        Self {
            program,
            globals,
            initialized: AtomicBool::new(initialized),
        }
    }

    /// The executed program
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Global variable storage
    pub fn globals(&self) -> &Arc<VariableContext> {
        &self.globals
    }

    /// Read a global variable by name
    pub fn global_by_name(&self, name: &str) -> Option<Value> {
        let index = self.program.variable_names.iter().position(|n| n == name)?;
        self.globals.get(index)
    }

    /// Whether the initialization function has started, or the program has none
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }
}
