//! Value coercion against schema types.
//!
//! Three directions:
//! - literal check: is an argument literal valid for an input type
//! - input coercion: turn a JSON variable value into a value of an input type
//! - output coercion: serialize a resolved JSON value as a leaf type

use serde_json::Value;

use crate::language::{InputValue, TypeRef};

use super::types::{NamedType, Schema};

const INT_MIN: i64 = i32::MIN as i64;
const INT_MAX: i64 = i32::MAX as i64;

/// Check an argument literal against an input type.
///
/// Variables are accepted here; their usage is checked separately.
pub fn check_literal(schema: &Schema, ty: &TypeRef, value: &InputValue) -> Result<(), String> {
    if let InputValue::Variable(_) = value {
        return Ok(());
    }
    match ty {
        TypeRef::NonNull(inner) => {
            if matches!(value, InputValue::Null) {
                return Err(format!("Expected value of type \"{}\", found null.", ty));
            }
            check_literal(schema, inner, value)
        }
        TypeRef::List(inner) => match value {
            InputValue::Null => Ok(()),
            InputValue::List(items) => items
                .iter()
                .try_for_each(|item| check_literal(schema, inner, item)),
            single => check_literal(schema, inner, single),
        },
        TypeRef::Named(name) => {
            if matches!(value, InputValue::Null) {
                return Ok(());
            }
            let mismatch = || format!("Expected value of type \"{}\", found {}.", name, value);
            match schema.get_type(name) {
                Some(NamedType::Scalar(scalar)) => {
                    let ok = match scalar.name.as_str() {
                        "Int" => matches!(value, InputValue::Int(i) if (INT_MIN..=INT_MAX).contains(i)),
                        "Float" => matches!(value, InputValue::Int(_) | InputValue::Float(_)),
                        "String" => matches!(value, InputValue::String(_)),
                        "Boolean" => matches!(value, InputValue::Boolean(_)),
                        "ID" => matches!(value, InputValue::String(_) | InputValue::Int(_)),
                        _ => true,
                    };
                    if ok {
                        Ok(())
                    } else {
                        Err(mismatch())
                    }
                }
                Some(NamedType::Enum(enum_type)) => match value {
                    InputValue::Enum(v) if enum_type.has_value(v) => Ok(()),
                    InputValue::Enum(v) => Err(format!(
                        "Value \"{}\" does not exist in \"{}\" enum.",
                        v, enum_type.name
                    )),
                    _ => Err(mismatch()),
                },
                Some(NamedType::Object(_)) | None => Err(mismatch()),
            }
        }
    }
}

/// Coerce a JSON variable value to an input type.
pub fn coerce_input(schema: &Schema, ty: &TypeRef, value: &Value) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{}\" not to be null.", ty));
            }
            coerce_input(schema, inner, value)
        }
        TypeRef::List(inner) => match value {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_input(schema, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            single => Ok(Value::Array(vec![coerce_input(schema, inner, single)?])),
        },
        TypeRef::Named(name) => {
            if value.is_null() {
                return Ok(Value::Null);
            }
            match schema.get_type(name) {
                Some(NamedType::Scalar(scalar)) => match scalar.name.as_str() {
                    "Int" => as_int(value)
                        .map(Value::from)
                        .ok_or_else(|| format!("Int cannot represent non-integer value: {}", value)),
                    "Float" if value.is_number() => Ok(value.clone()),
                    "Float" => Err(format!("Float cannot represent non numeric value: {}", value)),
                    "String" if value.is_string() => Ok(value.clone()),
                    "String" => Err(format!("String cannot represent a non string value: {}", value)),
                    "Boolean" if value.is_boolean() => Ok(value.clone()),
                    "Boolean" => Err(format!("Boolean cannot represent a non boolean value: {}", value)),
                    "ID" => match value {
                        Value::String(_) => Ok(value.clone()),
                        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
                        _ => Err(format!("ID cannot represent value: {}", value)),
                    },
                    _ => Ok(value.clone()),
                },
                Some(NamedType::Enum(enum_type)) => match value.as_str() {
                    Some(v) if enum_type.has_value(v) => Ok(value.clone()),
                    _ => Err(format!(
                        "Value {} does not exist in \"{}\" enum.",
                        value, enum_type.name
                    )),
                },
                Some(NamedType::Object(_)) | None => {
                    Err(format!("Type \"{}\" is not an input type.", name))
                }
            }
        }
    }
}

/// Serialize a resolved value as a leaf (scalar or enum) type.
pub fn serialize_leaf(named: &NamedType, value: &Value) -> Result<Value, String> {
    match named {
        NamedType::Scalar(scalar) => match scalar.name.as_str() {
            "Int" => match value {
                Value::Bool(b) => Some(*b as i64),
                Value::String(s) => s
                    .parse::<i64>()
                    .ok()
                    .filter(|i| (INT_MIN..=INT_MAX).contains(i)),
                other => as_int(other),
            }
            .map(Value::from)
            .ok_or_else(|| format!("Int cannot represent non-integer value: {}", value)),
            "Float" => match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            }
            .map(Value::from)
            .ok_or_else(|| format!("Float cannot represent non numeric value: {}", value)),
            "String" => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(format!("String cannot represent value: {}", value)),
            },
            "Boolean" => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
                _ => Err(format!("Boolean cannot represent a non boolean value: {}", value)),
            },
            "ID" => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
                _ => Err(format!("ID cannot represent value: {}", value)),
            },
            _ => Ok(value.clone()),
        },
        NamedType::Enum(enum_type) => match value.as_str() {
            Some(v) if enum_type.has_value(v) => Ok(value.clone()),
            _ => Err(format!(
                "Enum \"{}\" cannot represent value: {}",
                enum_type.name, value
            )),
        },
        NamedType::Object(object) => Err(format!(
            "Type \"{}\" is not a leaf type.",
            object.name
        )),
    }
}

/// A 32-bit integer view of a JSON number; integral floats are accepted.
fn as_int(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    let i = match n.as_i64() {
        Some(i) => i,
        None => {
            let f = n.as_f64()?;
            if f.fract() != 0.0 || !f.is_finite() {
                return None;
            }
            f as i64
        }
    };
    (INT_MIN..=INT_MAX).contains(&i).then_some(i)
}
