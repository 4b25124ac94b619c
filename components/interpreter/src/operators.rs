//! Typed operators
//!
//! Operands are converted to the operator's [`InsType`] before computing, so
//! `OpAdd(I4)` on an `I8` and a `String("3")` adds two `I32` values.
//! Integer arithmetic wraps at the operand width. Integer division or
//! remainder by zero fails, floating point division follows IEEE 754.

use bytecode_system::{InsCode, InsType};
use core_types::{builtin_type, Value, ValueError, ValueResult, ValueType};
use std::cmp::Ordering;

fn operand_tag(code: InsCode, ty: InsType) -> ValueResult<ValueType> {
    ty.value_type().ok_or_else(|| {
        ValueError::InvalidOperation(format!("{} on an operand of unknown type", code))
    })
}

fn coerce(value: &Value, tag: ValueType) -> ValueResult<Value> {
    builtin_type(tag).convert(value)
}

fn unsupported(code: InsCode, tag: ValueType) -> ValueError {
    ValueError::InvalidOperation(format!("{} is not defined for {:?}", code, tag))
}

fn integer(value: &Value) -> i128 {
    value.as_i128().unwrap_or_default()
}

fn float(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn make_float(n: f64, tag: ValueType) -> Value {
    match tag {
        ValueType::F32 => Value::F32(n as f32),
        _ => Value::F64(n),
    }
}

fn bit_width(tag: ValueType) -> u32 {
    match tag {
        ValueType::I8 | ValueType::U8 => 8,
        ValueType::I16 | ValueType::U16 => 16,
        ValueType::I32 | ValueType::U32 => 32,
        _ => 64,
    }
}

/// Apply `OpNot`, `OpPositive` or `OpNegative`.
pub fn unary(code: InsCode, ty: InsType, operand: &Value) -> ValueResult<Value> {
    let tag = operand_tag(code, ty)?;
    let value = coerce(operand, tag)?;
    match code {
        InsCode::OpNot => match value {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ if tag.is_integer() => Ok(Value::from_i128(!integer(&value), tag)),
            _ => Err(unsupported(code, tag)),
        },
        InsCode::OpPositive if tag.is_numeric() => Ok(value),
        InsCode::OpNegative if tag.is_signed() => {
            Ok(Value::from_i128(integer(&value).wrapping_neg(), tag))
        }
        InsCode::OpNegative if tag.is_float() => Ok(make_float(-float(&value), tag)),
        _ => Err(unsupported(code, tag)),
    }
}

/// Apply a binary arithmetic, bitwise or logical operator.
///
/// # Examples
///
/// ```
/// use bytecode_system::{InsCode, InsType};
/// use core_types::Value;
/// use interpreter::operators::binary;
///
/// let sum = binary(InsCode::OpAdd, InsType::I1, &Value::I8(127), &Value::I8(1)).unwrap();
/// assert_eq!(sum, Value::I8(-128));
/// assert!(binary(InsCode::OpDiv, InsType::I4, &Value::I32(1), &Value::I32(0)).is_err());
/// ```
pub fn binary(code: InsCode, ty: InsType, left: &Value, right: &Value) -> ValueResult<Value> {
    let tag = operand_tag(code, ty)?;
    let left = coerce(left, tag)?;
    let right = coerce(right, tag)?;
    if tag == ValueType::Bool {
        let (a, b) = (left.as_bool() == Some(true), right.as_bool() == Some(true));
        return match code {
            InsCode::OpAnd => Ok(Value::Bool(a && b)),
            InsCode::OpOr => Ok(Value::Bool(a || b)),
            InsCode::OpXor => Ok(Value::Bool(a ^ b)),
            _ => Err(unsupported(code, tag)),
        };
    }
    if tag.is_integer() {
        return integer_binary(code, tag, integer(&left), integer(&right));
    }
    if tag.is_float() {
        let (a, b) = (float(&left), float(&right));
        let n = match code {
            InsCode::OpAdd => a + b,
            InsCode::OpSub => a - b,
            InsCode::OpMul => a * b,
            InsCode::OpDiv => a / b,
            InsCode::OpExp => a.powf(b),
            _ => return Err(unsupported(code, tag)),
        };
        return Ok(make_float(n, tag));
    }
    Err(unsupported(code, tag))
}

// Computing in i128 and truncating to the operand width gives the same
// result as wrapping arithmetic at that width.
fn integer_binary(code: InsCode, tag: ValueType, a: i128, b: i128) -> ValueResult<Value> {
    let n = match code {
        InsCode::OpAdd => a.wrapping_add(b),
        InsCode::OpSub => a.wrapping_sub(b),
        InsCode::OpMul => a.wrapping_mul(b),
        InsCode::OpDiv if b == 0 => return Err(ValueError::DivisionByZero),
        InsCode::OpDiv => a.wrapping_div(b),
        InsCode::OpMod if b == 0 => return Err(ValueError::DivisionByZero),
        InsCode::OpMod => a.wrapping_rem(b),
        InsCode::OpExp => {
            let exponent = u32::try_from(b).map_err(|_| {
                ValueError::InvalidOperation(format!("integer exponent {} is out of range", b))
            })?;
            a.wrapping_pow(exponent)
        }
        InsCode::OpShl => a << (b as u32 & (bit_width(tag) - 1)),
        InsCode::OpShr => a >> (b as u32 & (bit_width(tag) - 1)),
        InsCode::OpAnd => a & b,
        InsCode::OpOr => a | b,
        InsCode::OpXor => a ^ b,
        _ => return Err(unsupported(code, tag)),
    };
    Ok(Value::from_i128(n, tag))
}

/// Concatenate two values as strings
pub fn concat(left: &Value, right: &Value) -> ValueResult<Value> {
    let string = builtin_type(ValueType::String);
    let left = string.convert(left)?;
    let right = string.convert(right)?;
    Ok(Value::string(format!(
        "{}{}",
        left.as_str().unwrap_or_default(),
        right.as_str().unwrap_or_default()
    )))
}

/// Three-way compare two literals, producing `I32` -1, 0 or 1.
///
/// Comparing NaN fails.
pub fn compare_literal(ty: InsType, left: &Value, right: &Value) -> ValueResult<Value> {
    let tag = operand_tag(InsCode::CompareLiteral, ty)?;
    let left = coerce(left, tag)?;
    let right = coerce(right, tag)?;
    let ordering = match (&left, &right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ if tag.is_integer() => integer(&left).cmp(&integer(&right)),
        _ if tag.is_float() => float(&left)
            .partial_cmp(&float(&right))
            .ok_or_else(|| ValueError::InvalidOperation("comparison with NaN".to_string()))?,
        _ => return Err(unsupported(InsCode::CompareLiteral, tag)),
    };
    Ok(Value::I32(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

/// Turn the result of `CompareLiteral` into the boolean of `OpLT` .. `OpNE`
pub fn test_compare_result(code: InsCode, result: &Value) -> ValueResult<bool> {
    let n = result.as_i128().ok_or(ValueError::TypeMismatch {
        expected: "comparison result",
        found: result.value_type(),
    })?;
    match code {
        InsCode::OpLT => Ok(n < 0),
        InsCode::OpGT => Ok(n > 0),
        InsCode::OpLE => Ok(n <= 0),
        InsCode::OpGE => Ok(n >= 0),
        InsCode::OpEQ => Ok(n == 0),
        InsCode::OpNE => Ok(n != 0),
        _ => Err(ValueError::InvalidOperation(format!(
            "{} is not a comparison test",
            code
        ))),
    }
}
