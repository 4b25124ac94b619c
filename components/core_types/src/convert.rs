//! Builtin type descriptors and the primitive conversion matrix.
//!
//! | target | accepted sources |
//! |---|---|
//! | Boolean | Boolean, the strings `"true"` and `"false"` |
//! | integers | integers in range, finite floats truncated into range, integer strings |
//! | floats | any number, strings parsed as floats |
//! | String | Boolean, any number, String |
//! | others | values of the same tag only |
//!
//! `null` never converts to a primitive type. An integer that does not fit
//! the target reports [`ValueError::Overflow`]; every other rejection reports
//! [`ValueError::Conversion`].

use crate::error::{ValueError, ValueResult};
use crate::handle::HandleId;
use crate::reflection::{TypeDescriptor, TypeRef};
use crate::value::{Value, ValueType};
use std::sync::{Arc, OnceLock};

const ALL_TYPES: [ValueType; 19] = [
    ValueType::Null,
    ValueType::Bool,
    ValueType::I8,
    ValueType::I16,
    ValueType::I32,
    ValueType::I64,
    ValueType::U8,
    ValueType::U16,
    ValueType::U32,
    ValueType::U64,
    ValueType::F32,
    ValueType::F64,
    ValueType::String,
    ValueType::List,
    ValueType::Map,
    ValueType::Range,
    ValueType::Object,
    ValueType::Function,
    ValueType::Type,
];

/// Descriptor of a builtin value tag.
#[derive(Debug)]
pub struct PrimitiveType {
    id: HandleId,
    tag: ValueType,
}

impl PrimitiveType {
    /// The value tag this type describes.
    pub fn tag(&self) -> ValueType {
        self.tag
    }

    fn conversion_error(&self, value: &Value) -> ValueError {
        ValueError::Conversion {
            from: value.value_type(),
            to: self.type_name().to_string(),
        }
    }

    fn to_integer(&self, value: &Value) -> ValueResult<Value> {
        let widened = match value {
            Value::F32(_) | Value::F64(_) => {
                let n = value.as_f64().unwrap_or(f64::NAN);
                if !n.is_finite() {
                    return Err(ValueError::Overflow("float to integer conversion"));
                }
                n.trunc() as i128
            }
            Value::String(text) => text
                .trim()
                .parse::<i128>()
                .map_err(|_| self.conversion_error(value))?,
            other => other.as_i128().ok_or_else(|| self.conversion_error(value))?,
        };
        integer_in_range(widened, self.tag).ok_or(ValueError::Overflow("integer conversion"))
    }

    fn to_float(&self, value: &Value) -> ValueResult<Value> {
        let n = match value {
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| self.conversion_error(value))?,
            other => other.as_f64().ok_or_else(|| self.conversion_error(value))?,
        };
        Ok(match self.tag {
            ValueType::F32 => Value::F32(n as f32),
            _ => Value::F64(n),
        })
    }
}

/// Build an integer of `tag` from `n`, or `None` when it does not fit.
pub fn integer_in_range(n: i128, tag: ValueType) -> Option<Value> {
    Some(match tag {
        ValueType::I8 => Value::I8(i8::try_from(n).ok()?),
        ValueType::I16 => Value::I16(i16::try_from(n).ok()?),
        ValueType::I32 => Value::I32(i32::try_from(n).ok()?),
        ValueType::I64 => Value::I64(i64::try_from(n).ok()?),
        ValueType::U8 => Value::U8(u8::try_from(n).ok()?),
        ValueType::U16 => Value::U16(u16::try_from(n).ok()?),
        ValueType::U32 => Value::U32(u32::try_from(n).ok()?),
        ValueType::U64 => Value::U64(u64::try_from(n).ok()?),
        _ => return None,
    })
}

impl TypeDescriptor for PrimitiveType {
    fn id(&self) -> HandleId {
        self.id
    }

    fn type_name(&self) -> &str {
        match self.tag {
            ValueType::Null => "system::Null",
            ValueType::Bool => "system::Boolean",
            ValueType::I8 => "system::Int8",
            ValueType::I16 => "system::Int16",
            ValueType::I32 => "system::Int32",
            ValueType::I64 => "system::Int64",
            ValueType::U8 => "system::UInt8",
            ValueType::U16 => "system::UInt16",
            ValueType::U32 => "system::UInt32",
            ValueType::U64 => "system::UInt64",
            ValueType::F32 => "system::Single",
            ValueType::F64 => "system::Double",
            ValueType::String => "system::String",
            ValueType::List => "system::Array",
            ValueType::Map => "system::Dictionary",
            ValueType::Range => "system::Range",
            ValueType::Object => "system::Object",
            ValueType::Function => "system::Function",
            ValueType::Type => "system::Type",
        }
    }

    fn is_assignable_from(&self, other: &dyn TypeDescriptor) -> bool {
        self.id == other.id() || self.tag == ValueType::Object
    }

    fn test(&self, value: &Value) -> bool {
        value.value_type() == self.tag
    }

    fn convert(&self, value: &Value) -> ValueResult<Value> {
        if self.test(value) {
            return Ok(value.clone());
        }
        match self.tag {
            ValueType::Bool => match value.as_str() {
                Some("true") => Ok(Value::Bool(true)),
                Some("false") => Ok(Value::Bool(false)),
                _ => Err(self.conversion_error(value)),
            },
            tag if tag.is_integer() => self.to_integer(value),
            tag if tag.is_float() => self.to_float(value),
            ValueType::String => match value {
                Value::Bool(_) => Ok(Value::string(value.to_string())),
                _ if value.value_type().is_numeric() => Ok(Value::string(value.to_string())),
                _ => Err(self.conversion_error(value)),
            },
            _ => Err(self.conversion_error(value)),
        }
    }
}

fn builtin_table() -> &'static Vec<TypeRef> {
    static TABLE: OnceLock<Vec<TypeRef>> = OnceLock::new();
    TABLE.get_or_init(|| {
        ALL_TYPES
            .iter()
            .map(|&tag| {
                Arc::new(PrimitiveType {
                    id: HandleId::next(),
                    tag,
                }) as TypeRef
            })
            .collect()
    })
}

/// The process-wide descriptor of a builtin value tag.
///
/// # Examples
///
/// ```
/// use core_types::{builtin_type, Value, ValueType};
///
/// let int32 = builtin_type(ValueType::I32);
/// assert_eq!(int32.type_name(), "system::Int32");
/// assert_eq!(int32.convert(&Value::string("12")).unwrap(), Value::I32(12));
/// assert!(int32.convert(&Value::Null).is_err());
/// ```
pub fn builtin_type(tag: ValueType) -> TypeRef {
    let index = ALL_TYPES.iter().position(|&t| t == tag).unwrap_or(0);
    builtin_table()[index].clone()
}

/// The builtin descriptor describing `value`'s own tag.
pub fn type_of(value: &Value) -> TypeRef {
    match value {
        Value::Object(object) => object.type_descriptor(),
        other => builtin_type(other.value_type()),
    }
}
