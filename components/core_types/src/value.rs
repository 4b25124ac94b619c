//! Dynamically-tagged runtime values.
//!
//! Primitive values are stored inline. Collections are shared, lockable
//! vectors so that a value can be handed between threads. Reflected objects,
//! callables and type descriptors are reference-counted trait objects.

use crate::reflection::{FunctionRef, ObjectRef, TypeRef};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared, mutable list of values.
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable association list. Keys are compared with
/// [`Value::loose_eq`].
pub type MapRef = Arc<RwLock<Vec<(Value, Value)>>>;

/// Tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// The null value
    Null,
    /// Boolean
    Bool,
    /// Signed 1-byte integer
    I8,
    /// Signed 2-byte integer
    I16,
    /// Signed 4-byte integer
    I32,
    /// Signed 8-byte integer
    I64,
    /// Unsigned 1-byte integer
    U8,
    /// Unsigned 2-byte integer
    U16,
    /// Unsigned 4-byte integer
    U32,
    /// Unsigned 8-byte integer
    U64,
    /// 4-byte float
    F32,
    /// 8-byte float
    F64,
    /// String
    String,
    /// List created by the interpreter
    List,
    /// Map created by the interpreter
    Map,
    /// Integer range
    Range,
    /// Reflected object
    Object,
    /// Callable function
    Function,
    /// Type descriptor
    Type,
}

impl ValueType {
    /// Whether this tag is one of the integer tags.
    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// Whether this tag is a signed integer tag.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ValueType::I8 | ValueType::I16 | ValueType::I32 | ValueType::I64
        )
    }

    /// Whether this tag is an unsigned integer tag.
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64
        )
    }

    /// Whether this tag is a floating point tag.
    pub fn is_float(self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }

    /// Whether this tag is numeric.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

/// An inclusive integer range `[begin, end]`, optionally enumerated
/// backwards.
///
/// Bounds are widened to `i128` so that every signed and unsigned 8-byte
/// value fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    /// First value of the range in ascending order
    pub begin: i128,
    /// Last value of the range in ascending order
    pub end: i128,
    /// Integer tag of the produced elements
    pub element: ValueType,
    /// Whether enumeration runs from `end` down to `begin`
    pub reversed: bool,
}

impl RangeValue {
    /// Number of elements in the range.
    pub fn len(&self) -> usize {
        if self.end < self.begin {
            0
        } else {
            usize::try_from(self.end - self.begin + 1).unwrap_or(usize::MAX)
        }
    }

    /// Whether the range has no element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `item` lies inside the range.
    pub fn contains(&self, item: i128) -> bool {
        self.begin <= item && item <= self.end
    }

    /// Enumerate the range in its current direction.
    pub fn iter(&self) -> Box<dyn Iterator<Item = Value>> {
        let element = self.element;
        let values = self.begin..=self.end;
        if self.reversed {
            Box::new(values.rev().map(move |n| Value::from_i128(n, element)))
        } else {
            Box::new(values.map(move |n| Value::from_i128(n, element)))
        }
    }
}

/// Any value an instruction can produce or consume.
///
/// # Examples
///
/// ```
/// use core_types::{Value, ValueType};
///
/// let number = Value::I32(42);
/// assert_eq!(number.value_type(), ValueType::I32);
/// assert_eq!(number.to_string(), "42");
///
/// let list = Value::new_list(vec![Value::I32(1), Value::I32(2)]);
/// assert_eq!(list.value_type(), ValueType::List);
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// The null value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed 1-byte integer
    I8(i8),
    /// Signed 2-byte integer
    I16(i16),
    /// Signed 4-byte integer
    I32(i32),
    /// Signed 8-byte integer
    I64(i64),
    /// Unsigned 1-byte integer
    U8(u8),
    /// Unsigned 2-byte integer
    U16(u16),
    /// Unsigned 4-byte integer
    U32(u32),
    /// Unsigned 8-byte integer
    U64(u64),
    /// 4-byte float
    F32(f32),
    /// 8-byte float
    F64(f64),
    /// Immutable string
    String(Arc<str>),
    /// Shared list
    List(ListRef),
    /// Shared map
    Map(MapRef),
    /// Integer range
    Range(RangeValue),
    /// Reflected object
    Object(ObjectRef),
    /// Callable function
    Function(FunctionRef),
    /// Type descriptor
    Type(TypeRef),
}

impl Value {
    /// Create a string value.
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Arc::from(text.as_ref()))
    }

    /// Create a new shared list.
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    /// Create a new shared map from key/value pairs.
    pub fn new_map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(Arc::new(RwLock::new(entries)))
    }

    /// Build an integer value of the given tag from a widened integer.
    ///
    /// Out-of-range inputs are truncated to the tag's width.
    pub fn from_i128(n: i128, tag: ValueType) -> Self {
        match tag {
            ValueType::I8 => Value::I8(n as i8),
            ValueType::I16 => Value::I16(n as i16),
            ValueType::I32 => Value::I32(n as i32),
            ValueType::U8 => Value::U8(n as u8),
            ValueType::U16 => Value::U16(n as u16),
            ValueType::U32 => Value::U32(n as u32),
            ValueType::U64 => Value::U64(n as u64),
            _ => Value::I64(n as i64),
        }
    }

    /// The tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
            Value::Range(_) => ValueType::Range,
            Value::Object(_) => ValueType::Object,
            Value::Function(_) => ValueType::Function,
            Value::Type(_) => ValueType::Type,
        }
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload widened to `i128`, if this is an integer.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::I8(n) => Some(*n as i128),
            Value::I16(n) => Some(*n as i128),
            Value::I32(n) => Some(*n as i128),
            Value::I64(n) => Some(*n as i128),
            Value::U8(n) => Some(*n as i128),
            Value::U16(n) => Some(*n as i128),
            Value::U32(n) => Some(*n as i128),
            Value::U64(n) => Some(*n as i128),
            _ => None,
        }
    }

    /// Numeric payload as `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(n) => Some(*n as f64),
            Value::F64(n) => Some(*n),
            other => other.as_i128().map(|n| n as f64),
        }
    }

    /// The reflected object, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Reference identity.
    ///
    /// Two nulls are identical; shared values are identical when they point
    /// to the same allocation; inline primitives are never identical.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.object_id() == b.object_id(),
            (Value::Function(a), Value::Function(b)) => a.function_id() == b.function_id(),
            (Value::Type(a), Value::Type(b)) => a.id() == b.id(),
            _ => false,
        }
    }

    /// Value equality used by `CompareValue`, set membership and map keys.
    ///
    /// Numbers compare by numeric value across tags, strings and booleans by
    /// content, everything else by reference identity.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_i128(), other.as_i128()) {
            return a == b;
        }
        if self.value_type().is_numeric() && other.value_type().is_numeric() {
            return match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            _ => self.same_reference(other),
        }
    }
}

/// Structural equality used by `CompareStruct`.
///
/// Same tag and same payload; collections compare element-wise, reflected
/// entities by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Arc::ptr_eq(a, b) || *a.read() == *b.read()
            }
            (Value::Map(a), Value::Map(b)) => {
                Arc::ptr_eq(a, b) || *a.read() == *b.read()
            }
            _ => self.same_reference(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::I8(n) => f.debug_tuple("I8").field(n).finish(),
            Value::I16(n) => f.debug_tuple("I16").field(n).finish(),
            Value::I32(n) => f.debug_tuple("I32").field(n).finish(),
            Value::I64(n) => f.debug_tuple("I64").field(n).finish(),
            Value::U8(n) => f.debug_tuple("U8").field(n).finish(),
            Value::U16(n) => f.debug_tuple("U16").field(n).finish(),
            Value::U32(n) => f.debug_tuple("U32").field(n).finish(),
            Value::U64(n) => f.debug_tuple("U64").field(n).finish(),
            Value::F32(n) => f.debug_tuple("F32").field(n).finish(),
            Value::F64(n) => f.debug_tuple("F64").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(&*items.read()).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(&*entries.read()).finish(),
            Value::Range(range) => f.debug_tuple("Range").field(range).finish(),
            Value::Object(object) => write!(
                f,
                "Object({} {})",
                object.type_descriptor().type_name(),
                object.object_id()
            ),
            Value::Function(function) => write!(f, "Function({})", function.name()),
            Value::Type(ty) => write!(f, "Type({})", ty.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I8(n) => write!(f, "{}", n),
            Value::I16(n) => write!(f, "{}", n),
            Value::I32(n) => write!(f, "{}", n),
            Value::I64(n) => write!(f, "{}", n),
            Value::U8(n) => write!(f, "{}", n),
            Value::U16(n) => write!(f, "{}", n),
            Value::U32(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::F32(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Range(range) => write!(f, "range [{}, {}]", range.begin, range.end),
            Value::Object(object) => write!(f, "<{}>", object.type_descriptor().type_name()),
            Value::Function(function) => write!(f, "<function {}>", function.name()),
            Value::Type(ty) => write!(f, "{}", ty.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::F64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}
