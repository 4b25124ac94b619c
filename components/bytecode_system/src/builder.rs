//! Incremental program construction
//!
//! Used by loaders and by tests to assemble a [`Program`] one instruction at
//! a time, in the same way a code generator would.

use crate::instruction::Instruction;
use crate::program::{FunctionDescriptor, InstructionDebugInfo, Program};
use core_types::TextRange;
use thiserror::Error;

/// Failure while assembling a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A function is already open
    #[error("function {0} is still open")]
    FunctionNotClosed(String),
    /// No function is open
    #[error("no function is open")]
    NoOpenFunction,
    /// A function was closed without emitting an instruction
    #[error("function {0} has no instruction")]
    EmptyFunction(String),
    /// The instruction has no label to patch
    #[error("instruction {0} has no label")]
    NotALabel(usize),
    /// An instruction index is out of range
    #[error("instruction {0} does not exist")]
    InstructionOutOfRange(usize),
    /// A label points outside the program
    #[error("instruction {instruction} jumps to missing instruction {label}")]
    LabelOutOfRange {
        /// Index of the jumping instruction
        instruction: usize,
        /// The invalid target
        label: usize,
    },
    /// An instruction references a missing function
    #[error("instruction {instruction} references missing function {function}")]
    UnknownFunction {
        /// Index of the referencing instruction
        instruction: usize,
        /// The invalid function index
        function: usize,
    },
}

/// Assembles a [`Program`].
///
/// # Examples
///
/// ```
/// use bytecode_system::{InsType, Instruction, ProgramBuilder};
/// use core_types::Value;
///
/// let mut builder = ProgramBuilder::new();
/// builder.begin_function("add", &["a", "b"], &[]).unwrap();
/// builder.emit(Instruction::LoadLocalVar(0));
/// builder.emit(Instruction::LoadLocalVar(1));
/// builder.emit(Instruction::OpAdd(InsType::I4));
/// builder.emit(Instruction::Return);
/// builder.end_function().unwrap();
///
/// let program = builder.build().unwrap();
/// assert_eq!(program.functions_named("add"), &[0]);
/// assert_eq!(program.functions[0].last_instruction, 3);
/// ```
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    variable_names: Vec<String>,
    functions: Vec<FunctionDescriptor>,
    instructions: Vec<Instruction>,
    before_codegen: InstructionDebugInfo,
    after_codegen: InstructionDebugInfo,
    mapped: bool,
    current: Option<usize>,
}

impl ProgramBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a global variable and return its index
    pub fn add_global(&mut self, name: &str) -> usize {
        self.variable_names.push(name.to_string());
        self.variable_names.len() - 1
    }

    /// Register the source of a module in both debug tables and return its code index
    pub fn add_module_code(&mut self, code: &str) -> usize {
        self.mapped = true;
        self.before_codegen.module_codes.push(code.to_string());
        self.after_codegen.module_codes.push(code.to_string());
        self.before_codegen.module_codes.len() - 1
    }

    /// Open a new function starting at the next instruction and return its index
    pub fn begin_function(
        &mut self,
        name: &str,
        arguments: &[&str],
        captured: &[&str],
    ) -> Result<usize, BuildError> {
        if let Some(open) = self.current {
            return Err(BuildError::FunctionNotClosed(
                self.functions[open].name.clone(),
            ));
        }
        self.functions.push(FunctionDescriptor {
            name: name.to_string(),
            argument_names: arguments.iter().map(|s| s.to_string()).collect(),
            captured_variable_names: captured.iter().map(|s| s.to_string()).collect(),
            local_variable_names: Vec::new(),
            first_instruction: self.instructions.len(),
            last_instruction: self.instructions.len(),
        });
        let index = self.functions.len() - 1;
        self.current = Some(index);
        Ok(index)
    }

    /// Declare a local variable of the open function.
    ///
    /// Returns the slot index used by `LoadLocalVar`, which follows the
    /// argument slots.
    pub fn add_local(&mut self, name: &str) -> Result<usize, BuildError> {
        let index = self.current.ok_or(BuildError::NoOpenFunction)?;
        let function = &mut self.functions[index];
        function.local_variable_names.push(name.to_string());
        Ok(function.fixed_variable_count() - 1)
    }

    /// Close the open function at the last emitted instruction
    pub fn end_function(&mut self) -> Result<usize, BuildError> {
        let index = self.current.take().ok_or(BuildError::NoOpenFunction)?;
        let function = &mut self.functions[index];
        if self.instructions.len() <= function.first_instruction {
            return Err(BuildError::EmptyFunction(function.name.clone()));
        }
        function.last_instruction = self.instructions.len() - 1;
        Ok(index)
    }

    /// Index the next emitted instruction will get
    pub fn next_index(&self) -> usize {
        self.instructions.len()
    }

    /// Emit an instruction without source mapping
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        self.emit_mapped(instruction, None, None)
    }

    /// Emit an instruction mapped to the same range in both debug tables
    pub fn emit_at(&mut self, instruction: Instruction, range: TextRange) -> usize {
        self.emit_mapped(instruction, Some(range), Some(range))
    }

    /// Emit an instruction with independent before- and after-codegen ranges
    pub fn emit_mapped(
        &mut self,
        instruction: Instruction,
        before_codegen: Option<TextRange>,
        after_codegen: Option<TextRange>,
    ) -> usize {
        if before_codegen.is_some() || after_codegen.is_some() {
            self.mapped = true;
        }
        self.instructions.push(instruction);
        self.before_codegen.instruction_code_mapping.push(before_codegen);
        self.after_codegen.instruction_code_mapping.push(after_codegen);
        self.instructions.len() - 1
    }

    /// Point the label of an emitted `Jump`, `JumpIf` or `InstallTry` at `target`
    pub fn patch_label(&mut self, at: usize, target: usize) -> Result<(), BuildError> {
        let instruction = self
            .instructions
            .get_mut(at)
            .ok_or(BuildError::InstructionOutOfRange(at))?;
        if instruction.set_label(target) {
            Ok(())
        } else {
            Err(BuildError::NotALabel(at))
        }
    }

    /// Validate labels and function references and produce the program
    pub fn build(self) -> Result<Program, BuildError> {
        if let Some(open) = self.current {
            return Err(BuildError::FunctionNotClosed(
                self.functions[open].name.clone(),
            ));
        }
        for (index, instruction) in self.instructions.iter().enumerate() {
            if let Some(label) = instruction.label() {
                if label >= self.instructions.len() {
                    return Err(BuildError::LabelOutOfRange {
                        instruction: index,
                        label,
                    });
                }
            }
            if let Some(function) = instruction.function() {
                if function >= self.functions.len() {
                    return Err(BuildError::UnknownFunction {
                        instruction: index,
                        function,
                    });
                }
            }
        }
        let (before_codegen, after_codegen) = if self.mapped {
            (Some(self.before_codegen), Some(self.after_codegen))
        } else {
            (None, None)
        };
        Ok(Program::new(
            self.variable_names,
            self.functions,
            self.instructions,
            before_codegen,
            after_codegen,
        ))
    }
}
