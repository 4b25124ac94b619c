//! Values and the reflection boundary of the scripting runtime.
//!
//! This crate provides the dynamically-tagged [`Value`] every instruction
//! operates on, the traits through which the interpreter reaches the
//! reflection layer, and the builtin conversion rules.
//!
//! # Overview
//!
//! - [`Value`] - Tagged runtime value
//! - [`ValueError`] - Failure of a conversion, operator or reflection call
//! - [`TypeDescriptor`], [`ReflectedObject`], [`PropertyInfo`],
//!   [`MethodInfo`], [`EventInfo`], [`Callable`] - Reflection boundary
//! - [`HandleId`] - Stable identity used as a breakpoint key
//! - [`TextRange`] - Source range referenced by debug tables
//!
//! # Examples
//!
//! ```
//! use core_types::{builtin_type, Value, ValueType};
//!
//! let text = Value::string("41");
//! let number = builtin_type(ValueType::I32).convert(&text).unwrap();
//! assert_eq!(number, Value::I32(41));
//! assert!(number.loose_eq(&Value::I64(41)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod convert;
mod error;
mod handle;
pub mod reflection;
mod source;
mod value;

pub use convert::{builtin_type, integer_in_range, type_of, PrimitiveType};
pub use error::{ValueError, ValueResult};
pub use handle::HandleId;
pub use reflection::{
    Accessor, Callable, EventInfo, EventRef, FunctionRef, MethodInfo, MethodRef, NativeFunction,
    ObjectRef, PropertyInfo, PropertyRef, ReflectedObject, TypeDescriptor, TypeRef,
};
pub use source::{TextPosition, TextRange};
pub use value::{ListRef, MapRef, RangeValue, Value, ValueType};
