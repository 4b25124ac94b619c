//! Bytecode instruction representation
//!
//! Each variant carries exactly the payload its operation needs.

use crate::opcode::{InsCode, InsType};
use core_types::{EventRef, MethodRef, PropertyRef, TypeRef, Value};

/// A single instruction.
///
/// Labels are absolute instruction indexes into
/// [`Program::instructions`](crate::Program::instructions).
#[derive(Debug, Clone)]
pub enum Instruction {
    /// Do nothing
    Nop,
    /// Push a literal value
    LoadValue(Value),
    /// Create a closure over function `function`, capturing `count` values
    LoadClosure {
        /// Function index
        function: usize,
        /// Number of captured values popped from the stack
        count: usize,
    },
    /// Push the exception of the innermost handled raise
    LoadException,
    /// Push a local variable or argument
    LoadLocalVar(usize),
    /// Push a captured variable
    LoadCapturedVar(usize),
    /// Push a global variable
    LoadGlobalVar(usize),
    /// Pop into a local variable or argument
    StoreLocalVar(usize),
    /// Pop into a global variable
    StoreGlobalVar(usize),
    /// Push a copy of the value `count` slots below the top
    Duplicate(usize),
    /// Discard the top value
    Pop,
    /// Leave the current function with the top value
    Return,
    /// Pop `count` values into a new list
    CreateArray(usize),
    /// Pop `count` values, alternating value and key, into a new map
    CreateMap(usize),
    /// Pop `count` values, alternating function and method name, into an
    /// interface proxy
    CreateInterface(usize),
    /// Pop the end and the begin of an inclusive range of this integer type
    CreateRange(InsType),
    /// Reverse the enumeration order of a list or range
    ReverseEnumerable,
    /// Dispose the object on top of the stack
    DeleteRawPtr,
    /// Convert to a type, raising on failure
    ConvertToType(TypeRef),
    /// Convert to a type, producing null on failure
    TryConvertToType(TypeRef),
    /// Test whether a value is an instance of a type
    TestType(TypeRef),
    /// Push the runtime type of a value
    GetType,
    /// Continue at a label
    Jump(usize),
    /// Pop a boolean and continue at a label when it is true
    JumpIf(usize),
    /// Call function `function` with `count` arguments
    Invoke {
        /// Function index
        function: usize,
        /// Argument count
        count: usize,
    },
    /// Read a property
    GetProperty(PropertyRef),
    /// Call the function value on top of the stack with `count` arguments
    InvokeProxy(usize),
    /// Call a reflected method with `count` arguments
    InvokeMethod {
        /// Method to call
        method: MethodRef,
        /// Argument count
        count: usize,
    },
    /// Attach a handler to an event
    AttachEvent(EventRef),
    /// Detach a listener from an event
    DetachEvent(EventRef),
    /// Enter a protected region whose handler starts at a label
    InstallTry(usize),
    /// Leave a protected region, keeping `count` values pushed inside it
    UninstallTry(usize),
    /// Raise the value on top of the stack
    RaiseException,
    /// Test whether an element is contained in a list, map or range
    TestElementInSet,
    /// Three-way compare two literals of this type
    CompareLiteral(InsType),
    /// Deep equality
    CompareStruct,
    /// Reference identity
    CompareReference,
    /// Value equality
    CompareValue,
    /// Logical or bitwise not
    OpNot(InsType),
    /// Unary plus
    OpPositive(InsType),
    /// Unary minus
    OpNegative(InsType),
    /// String concatenation
    OpConcat,
    /// Exponentiation
    OpExp(InsType),
    /// Addition
    OpAdd(InsType),
    /// Subtraction
    OpSub(InsType),
    /// Multiplication
    OpMul(InsType),
    /// Division
    OpDiv(InsType),
    /// Remainder
    OpMod(InsType),
    /// Shift left
    OpShl(InsType),
    /// Shift right
    OpShr(InsType),
    /// Logical or bitwise exclusive or
    OpXor(InsType),
    /// Logical or bitwise and
    OpAnd(InsType),
    /// Logical or bitwise or
    OpOr(InsType),
    /// Compare result `< 0`
    OpLT,
    /// Compare result `> 0`
    OpGT,
    /// Compare result `<= 0`
    OpLE,
    /// Compare result `>= 0`
    OpGE,
    /// Compare result `== 0`
    OpEQ,
    /// Compare result `!= 0`
    OpNE,
}

impl Instruction {
    /// The operation code of this instruction.
    pub fn code(&self) -> InsCode {
        match self {
            Instruction::Nop => InsCode::Nop,
            Instruction::LoadValue(_) => InsCode::LoadValue,
            Instruction::LoadClosure { .. } => InsCode::LoadClosure,
            Instruction::LoadException => InsCode::LoadException,
            Instruction::LoadLocalVar(_) => InsCode::LoadLocalVar,
            Instruction::LoadCapturedVar(_) => InsCode::LoadCapturedVar,
            Instruction::LoadGlobalVar(_) => InsCode::LoadGlobalVar,
            Instruction::StoreLocalVar(_) => InsCode::StoreLocalVar,
            Instruction::StoreGlobalVar(_) => InsCode::StoreGlobalVar,
            Instruction::Duplicate(_) => InsCode::Duplicate,
            Instruction::Pop => InsCode::Pop,
            Instruction::Return => InsCode::Return,
            Instruction::CreateArray(_) => InsCode::CreateArray,
            Instruction::CreateMap(_) => InsCode::CreateMap,
            Instruction::CreateInterface(_) => InsCode::CreateInterface,
            Instruction::CreateRange(_) => InsCode::CreateRange,
            Instruction::ReverseEnumerable => InsCode::ReverseEnumerable,
            Instruction::DeleteRawPtr => InsCode::DeleteRawPtr,
            Instruction::ConvertToType(_) => InsCode::ConvertToType,
            Instruction::TryConvertToType(_) => InsCode::TryConvertToType,
            Instruction::TestType(_) => InsCode::TestType,
            Instruction::GetType => InsCode::GetType,
            Instruction::Jump(_) => InsCode::Jump,
            Instruction::JumpIf(_) => InsCode::JumpIf,
            Instruction::Invoke { .. } => InsCode::Invoke,
            Instruction::GetProperty(_) => InsCode::GetProperty,
            Instruction::InvokeProxy(_) => InsCode::InvokeProxy,
            Instruction::InvokeMethod { .. } => InsCode::InvokeMethod,
            Instruction::AttachEvent(_) => InsCode::AttachEvent,
            Instruction::DetachEvent(_) => InsCode::DetachEvent,
            Instruction::InstallTry(_) => InsCode::InstallTry,
            Instruction::UninstallTry(_) => InsCode::UninstallTry,
            Instruction::RaiseException => InsCode::RaiseException,
            Instruction::TestElementInSet => InsCode::TestElementInSet,
            Instruction::CompareLiteral(_) => InsCode::CompareLiteral,
            Instruction::CompareStruct => InsCode::CompareStruct,
            Instruction::CompareReference => InsCode::CompareReference,
            Instruction::CompareValue => InsCode::CompareValue,
            Instruction::OpNot(_) => InsCode::OpNot,
            Instruction::OpPositive(_) => InsCode::OpPositive,
            Instruction::OpNegative(_) => InsCode::OpNegative,
            Instruction::OpConcat => InsCode::OpConcat,
            Instruction::OpExp(_) => InsCode::OpExp,
            Instruction::OpAdd(_) => InsCode::OpAdd,
            Instruction::OpSub(_) => InsCode::OpSub,
            Instruction::OpMul(_) => InsCode::OpMul,
            Instruction::OpDiv(_) => InsCode::OpDiv,
            Instruction::OpMod(_) => InsCode::OpMod,
            Instruction::OpShl(_) => InsCode::OpShl,
            Instruction::OpShr(_) => InsCode::OpShr,
            Instruction::OpXor(_) => InsCode::OpXor,
            Instruction::OpAnd(_) => InsCode::OpAnd,
            Instruction::OpOr(_) => InsCode::OpOr,
            Instruction::OpLT => InsCode::OpLT,
            Instruction::OpGT => InsCode::OpGT,
            Instruction::OpLE => InsCode::OpLE,
            Instruction::OpGE => InsCode::OpGE,
            Instruction::OpEQ => InsCode::OpEQ,
            Instruction::OpNE => InsCode::OpNE,
        }
    }

    /// The jump target of `Jump`, `JumpIf` and `InstallTry`.
    pub fn label(&self) -> Option<usize> {
        match self {
            Instruction::Jump(label)
            | Instruction::JumpIf(label)
            | Instruction::InstallTry(label) => Some(*label),
            _ => None,
        }
    }

    /// Replace the jump target. Returns `false` when the instruction has no label.
    pub fn set_label(&mut self, target: usize) -> bool {
        match self {
            Instruction::Jump(label)
            | Instruction::JumpIf(label)
            | Instruction::InstallTry(label) => {
                *label = target;
                true
            }
            _ => false,
        }
    }

    /// The function index referenced by `Invoke` and `LoadClosure`.
    pub fn function(&self) -> Option<usize> {
        match self {
            Instruction::Invoke { function, .. } | Instruction::LoadClosure { function, .. } => {
                Some(*function)
            }
            _ => None,
        }
    }
}
