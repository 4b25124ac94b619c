//! Compiled program container
//!
//! A [`Program`] is immutable once built. Thread contexts share it through an
//! `Arc` and never modify it.

use crate::instruction::Instruction;
use core_types::{HandleId, TextRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Name tables and instruction range of one compiled function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Function name
    pub name: String,
    /// Argument names, in argument order
    pub argument_names: Vec<String>,
    /// Captured variable names, in capture order
    pub captured_variable_names: Vec<String>,
    /// Local variable names; local slots follow the arguments
    pub local_variable_names: Vec<String>,
    /// Index of the first instruction of the function
    pub first_instruction: usize,
    /// Index of the last instruction of the function
    pub last_instruction: usize,
}

impl FunctionDescriptor {
    /// Number of slots in the local variable region: arguments, then locals.
    pub fn fixed_variable_count(&self) -> usize {
        self.argument_names.len() + self.local_variable_names.len()
    }

    /// Whether `instruction` belongs to this function.
    pub fn contains(&self, instruction: usize) -> bool {
        self.first_instruction <= instruction && instruction <= self.last_instruction
    }
}

/// Mapping between instructions and source text.
///
/// `code_instruction_mapping` is derived from `instruction_code_mapping` by
/// [`InstructionDebugInfo::initialize`] and is not serialized.
///
/// # Examples
///
/// ```
/// use bytecode_system::InstructionDebugInfo;
/// use core_types::TextRange;
///
/// let mut info = InstructionDebugInfo::new(vec!["let x = 1;".to_string()]);
/// let row = Some(TextRange::line(0, 0));
/// info.instruction_code_mapping = vec![row, None, row];
/// info.initialize();
/// assert_eq!(info.instructions_at(0, 0), &[0, 2]);
/// assert!(info.instructions_at(0, 1).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionDebugInfo {
    /// Source text of every module, addressed by `TextRange::code_index`
    pub module_codes: Vec<String>,
    /// Source range of every instruction
    pub instruction_code_mapping: Vec<Option<TextRange>>,
    #[serde(skip)]
    code_instruction_mapping: BTreeMap<(usize, usize), Vec<usize>>,
}

impl InstructionDebugInfo {
    /// Create a table for the given module sources with no instruction mapped.
    pub fn new(module_codes: Vec<String>) -> Self {
        Self {
            module_codes,
            ..Self::default()
        }
    }

    /// Rebuild the `(code_index, row) -> instructions` map.
    ///
    /// An instruction is listed under every row its range spans.
    pub fn initialize(&mut self) {
        self.code_instruction_mapping.clear();
        for (instruction, range) in self.instruction_code_mapping.iter().enumerate() {
            if let Some(range) = range {
                for row in range.start.row..=range.end.row {
                    self.code_instruction_mapping
                        .entry((range.code_index, row))
                        .or_default()
                        .push(instruction);
                }
            }
        }
    }

    /// Source range of an instruction.
    pub fn range(&self, instruction: usize) -> Option<&TextRange> {
        self.instruction_code_mapping
            .get(instruction)
            .and_then(|range| range.as_ref())
    }

    /// Instructions whose range covers a row, in ascending order.
    pub fn instructions_at(&self, code_index: usize, row: usize) -> &[usize] {
        self.code_instruction_mapping
            .get(&(code_index, row))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Source text of one line of a module.
    pub fn source_line(&self, code_index: usize, row: usize) -> Option<&str> {
        self.module_codes.get(code_index)?.lines().nth(row)
    }
}

/// A compiled program.
#[derive(Debug)]
pub struct Program {
    id: HandleId,
    /// Global variable names
    pub variable_names: Vec<String>,
    /// Function indexes by name; several functions may share a name
    pub function_by_name: HashMap<String, Vec<usize>>,
    /// Function descriptors
    pub functions: Vec<FunctionDescriptor>,
    /// The flat instruction sequence
    pub instructions: Vec<Instruction>,
    /// Mapping to the code written by the user
    pub before_codegen: Option<InstructionDebugInfo>,
    /// Mapping to the code generated by the final compiling pass
    pub after_codegen: Option<InstructionDebugInfo>,
}

impl Program {
    /// Assemble a program from its tables.
    ///
    /// `function_by_name` is derived from the descriptors and debug tables
    /// are initialized.
    pub fn new(
        variable_names: Vec<String>,
        functions: Vec<FunctionDescriptor>,
        instructions: Vec<Instruction>,
        before_codegen: Option<InstructionDebugInfo>,
        after_codegen: Option<InstructionDebugInfo>,
    ) -> Self {
        let mut function_by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, function) in functions.iter().enumerate() {
            function_by_name
                .entry(function.name.clone())
                .or_default()
                .push(index);
        }
        let initialize = |info: Option<InstructionDebugInfo>| {
            info.map(|mut info| {
                info.initialize();
                info
            })
        };
        Self {
            id: HandleId::next(),
            variable_names,
            function_by_name,
            functions,
            instructions,
            before_codegen: initialize(before_codegen),
            after_codegen: initialize(after_codegen),
        }
    }

    /// Stable identity of this program, used as a breakpoint key.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Indexes of the functions with the given name.
    pub fn functions_named(&self, name: &str) -> &[usize] {
        self.function_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Descriptor of a function.
    pub fn function(&self, index: usize) -> Option<&FunctionDescriptor> {
        self.functions.get(index)
    }

    /// Index of the function whose range contains `instruction`.
    pub fn function_of(&self, instruction: usize) -> Option<usize> {
        self.functions
            .iter()
            .position(|function| function.contains(instruction))
    }

    /// The debug table selected by `before_codegen`.
    pub fn debug_info(&self, before_codegen: bool) -> Option<&InstructionDebugInfo> {
        if before_codegen {
            self.before_codegen.as_ref()
        } else {
            self.after_codegen.as_ref()
        }
    }
}
