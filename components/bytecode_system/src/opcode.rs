//! Operation codes and operand type tags.
//!
//! [`InsCode`] names an operation without its payload. It is what the
//! debugger and diagnostics print, and what tests match on when the payload
//! is irrelevant.

use core_types::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operand type selected by the compiler for typed operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsType {
    /// Boolean
    Bool,
    /// Signed 1-byte integer
    I1,
    /// Signed 2-byte integer
    I2,
    /// Signed 4-byte integer
    I4,
    /// Signed 8-byte integer
    I8,
    /// Unsigned 1-byte integer
    U1,
    /// Unsigned 2-byte integer
    U2,
    /// Unsigned 4-byte integer
    U4,
    /// Unsigned 8-byte integer
    U8,
    /// 4-byte float
    F4,
    /// 8-byte float
    F8,
    /// String
    String,
    /// Not statically known
    Unknown,
}

impl InsType {
    /// The value tag operands of this type are converted to.
    ///
    /// Returns `None` for [`InsType::Unknown`].
    pub fn value_type(self) -> Option<ValueType> {
        Some(match self {
            InsType::Bool => ValueType::Bool,
            InsType::I1 => ValueType::I8,
            InsType::I2 => ValueType::I16,
            InsType::I4 => ValueType::I32,
            InsType::I8 => ValueType::I64,
            InsType::U1 => ValueType::U8,
            InsType::U2 => ValueType::U16,
            InsType::U4 => ValueType::U32,
            InsType::U8 => ValueType::U64,
            InsType::F4 => ValueType::F32,
            InsType::F8 => ValueType::F64,
            InsType::String => ValueType::String,
            InsType::Unknown => return None,
        })
    }

    /// Whether this is one of the integer types.
    pub fn is_integer(self) -> bool {
        self.value_type().map(ValueType::is_integer).unwrap_or(false)
    }
}

/// Operation code of an [`Instruction`](crate::Instruction).
///
/// Stack effects are written bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsCode {
    /// `() -> ()`
    Nop,
    /// `() -> value`
    LoadValue,
    /// `captured-1 .. captured-n -> function`
    LoadClosure,
    /// `() -> exception`
    LoadException,
    /// `() -> value`
    LoadLocalVar,
    /// `() -> value`
    LoadCapturedVar,
    /// `() -> value`
    LoadGlobalVar,
    /// `value -> ()`
    StoreLocalVar,
    /// `value -> ()`
    StoreGlobalVar,
    /// `() -> copy of stack[len - 1 - count]`
    Duplicate,
    /// `value -> ()`
    Pop,
    /// `value -> value`, leaves the function
    Return,
    /// `value-n .. value-1 -> list`
    CreateArray,
    /// `key-n value-n .. key-1 value-1 -> map`
    CreateMap,
    /// `name-n function-n .. name-1 function-1 -> interface proxy`
    CreateInterface,
    /// `begin end -> range`
    CreateRange,
    /// `enumerable -> enumerable`
    ReverseEnumerable,
    /// `object -> ()`
    DeleteRawPtr,
    /// `value -> value`
    ConvertToType,
    /// `value -> value or null`
    TryConvertToType,
    /// `value -> bool`
    TestType,
    /// `value -> type`
    GetType,
    /// `() -> ()`
    Jump,
    /// `bool -> ()`
    JumpIf,
    /// `arg-1 .. arg-n -> result`
    Invoke,
    /// `this -> value`
    GetProperty,
    /// `arg-1 .. arg-n function -> result`
    InvokeProxy,
    /// `arg-1 .. arg-n this -> result`
    InvokeMethod,
    /// `this handler -> listener`
    AttachEvent,
    /// `this listener -> bool`
    DetachEvent,
    /// `() -> ()`
    InstallTry,
    /// `() -> ()`
    UninstallTry,
    /// `exception -> ()`
    RaiseException,
    /// `element set -> bool`
    TestElementInSet,
    /// `a b -> int`
    CompareLiteral,
    /// `a b -> bool`
    CompareStruct,
    /// `a b -> bool`
    CompareReference,
    /// `a b -> bool`
    CompareValue,
    /// `a -> a`
    OpNot,
    /// `a -> a`
    OpPositive,
    /// `a -> a`
    OpNegative,
    /// `string string -> string`
    OpConcat,
    /// `a b -> a`
    OpExp,
    /// `a b -> a`
    OpAdd,
    /// `a b -> a`
    OpSub,
    /// `a b -> a`
    OpMul,
    /// `a b -> a`
    OpDiv,
    /// `a b -> a`
    OpMod,
    /// `a b -> a`
    OpShl,
    /// `a b -> a`
    OpShr,
    /// `a b -> a`
    OpXor,
    /// `a b -> a`
    OpAnd,
    /// `a b -> a`
    OpOr,
    /// `int -> bool`
    OpLT,
    /// `int -> bool`
    OpGT,
    /// `int -> bool`
    OpLE,
    /// `int -> bool`
    OpGE,
    /// `int -> bool`
    OpEQ,
    /// `int -> bool`
    OpNE,
}

impl InsCode {
    /// Check if this code ends a basic block
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            InsCode::Return | InsCode::Jump | InsCode::JumpIf | InsCode::RaiseException
        )
    }

    /// Check if this code never falls through to the next instruction
    pub fn is_unconditional_terminator(self) -> bool {
        matches!(
            self,
            InsCode::Return | InsCode::Jump | InsCode::RaiseException
        )
    }

    /// Check if this code delegates to the reflection layer through a member
    pub fn is_member_access(self) -> bool {
        matches!(
            self,
            InsCode::GetProperty
                | InsCode::InvokeMethod
                | InsCode::AttachEvent
                | InsCode::DetachEvent
        )
    }

    /// Check if this code carries a jump target
    pub fn has_label(self) -> bool {
        matches!(self, InsCode::Jump | InsCode::JumpIf | InsCode::InstallTry)
    }
}

impl fmt::Display for InsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
