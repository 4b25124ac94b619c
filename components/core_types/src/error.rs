//! Errors produced at the value/reflection boundary.
//!
//! Every variant is a script-level failure: the interpreter turns it into a
//! catchable exception. Only `Raised` may carry the fatal flag, when a nested
//! execution already failed fatally.

use crate::reflection::ObjectRef;
use crate::value::ValueType;
use thiserror::Error;

/// Failure of a conversion, operator or delegated reflection call.
///
/// # Examples
///
/// ```
/// use core_types::{ValueError, ValueType};
///
/// let error = ValueError::Conversion {
///     from: ValueType::String,
///     to: "system::Int32".to_string(),
/// };
/// assert!(!error.is_fatal());
/// assert_eq!(error.to_string(), "cannot convert a value of type String to system::Int32");
/// ```
#[derive(Debug, Clone, Error)]
pub enum ValueError {
    /// The value cannot be converted to the requested type
    #[error("cannot convert a value of type {from:?} to {to}")]
    Conversion {
        /// Tag of the source value
        from: ValueType,
        /// Name of the target type
        to: String,
    },
    /// An operand had an unexpected type
    #[error("type mismatch: expected {expected}, found {found:?}")]
    TypeMismatch {
        /// Description of the accepted operand
        expected: &'static str,
        /// Tag of the received operand
        found: ValueType,
    },
    /// Integer division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,
    /// Arithmetic result does not fit the operand type
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
    /// The operation is not defined for the operand type
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A member was accessed on a null value
    #[error("null reference while accessing {0}")]
    NullReference(String),
    /// Wrong number of arguments passed to a callable
    #[error("{callee} expects {expected} arguments, received {actual}")]
    ArgumentCount {
        /// Name of the callee
        callee: String,
        /// Expected argument count
        expected: usize,
        /// Received argument count
        actual: usize,
    },
    /// A native implementation failed
    #[error("{0}")]
    Native(String),
    /// A nested script execution raised an exception
    #[error("{message}")]
    Raised {
        /// Exception message
        message: String,
        /// Whether the nested execution failed fatally
        fatal: bool,
        /// The exception object, when the nested execution produced one
        exception: Option<ObjectRef>,
    },
}

impl ValueError {
    /// Whether this error reports a fatal failure of a nested execution.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValueError::Raised { fatal: true, .. })
    }
}

/// Result alias used throughout the reflection boundary.
pub type ValueResult<T> = Result<T, ValueError>;
