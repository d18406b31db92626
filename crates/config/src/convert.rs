//! Coercion of raw configuration values into typed values

use crate::{render::render, splitter::split_escaped};
use std::{
    collections::BTreeMap,
    num::{IntErrorKind, ParseIntError},
    str::FromStr,
    time::Duration,
};
use types::{
    utils::parse_duration, ConversionError, EnumType, EnumValue, MemorySize, Password, TypeTag,
    Value,
};

/// Convert `raw` into a value of type `tag`.
///
/// Values that already have the requested type are returned unchanged.
/// Errors raised for secret types or secret input never contain the raw input.
pub fn coerce(raw: Value, tag: &TypeTag) -> Result<Value, ConversionError> {
    tracing::trace!(target_type = %tag, raw_kind = raw.kind(), "Coercing configuration value");
    let mask_errors = tag.is_sensitive() || contains_secret(&raw);

    let result = match tag {
        TypeTag::Int32 => to_int(raw).map(Value::Int32),
        TypeTag::Int64 => to_long(raw).map(Value::Int64),
        TypeTag::Bool => to_bool(raw).map(Value::Bool),
        TypeTag::Float32 => to_float(raw).map(Value::Float32),
        TypeTag::Float64 => to_double(raw).map(Value::Float64),
        TypeTag::Text => Ok(Value::Text(to_text(raw))),
        TypeTag::Secret => Ok(Value::Secret(to_secret(raw))),
        TypeTag::Enum(enum_type) => to_enum(raw, enum_type).map(Value::Enum),
        TypeTag::Duration => to_duration(raw).map(Value::Duration),
        TypeTag::MemorySize => to_memory_size(raw).map(Value::MemorySize),
        TypeTag::MapOfText => to_map(raw).map(Value::Map),
        TypeTag::List(element) => to_list(raw, element).map(Value::List),
    };

    if mask_errors {
        result.map_err(ConversionError::masked)
    } else {
        result
    }
}

fn contains_secret(value: &Value) -> bool {
    match value {
        Value::Secret(_) => true,
        Value::List(items) => items.iter().any(contains_secret),
        _ => false,
    }
}

fn to_text(raw: Value) -> String {
    match raw {
        Value::Text(text) => text,
        other => render(&other),
    }
}

fn to_secret(raw: Value) -> Password {
    match raw {
        Value::Secret(password) => password,
        other => Password::new(to_text(other)),
    }
}

fn to_int(raw: Value) -> Result<i32, ConversionError> {
    match raw {
        Value::Int32(value) => Ok(value),
        Value::Int64(value) => {
            i32::try_from(value).map_err(|_| ConversionError::overflow(value, "int"))
        }
        other => parse_integer(&to_text(other), "int"),
    }
}

fn to_long(raw: Value) -> Result<i64, ConversionError> {
    match raw {
        Value::Int64(value) => Ok(value),
        Value::Int32(value) => Ok(i64::from(value)),
        other => parse_integer(&to_text(other), "long"),
    }
}

fn parse_integer<T>(text: &str, type_name: &str) -> Result<T, ConversionError>
where
    T: FromStr<Err = ParseIntError>,
{
    let trimmed = text.trim();
    trimmed.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionError::overflow(trimmed, type_name)
        }
        _ => ConversionError::parse(text, type_name, e.to_string()),
    })
}

fn to_bool(raw: Value) -> Result<bool, ConversionError> {
    if let Value::Bool(value) = raw {
        return Ok(value);
    }

    let text = to_text(raw);
    match text.trim().to_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(ConversionError::parse(
            text,
            "bool",
            "expected either TRUE or FALSE (case insensitive)",
        )),
    }
}

fn to_float(raw: Value) -> Result<f32, ConversionError> {
    match raw {
        Value::Float32(value) => Ok(value),
        Value::Float64(value) => {
            let magnitude = value.abs();
            let smallest = f64::from(f32::from_bits(1));
            if value == 0.0 || (smallest..=f64::from(f32::MAX)).contains(&magnitude) {
                Ok(value as f32)
            } else {
                Err(ConversionError::overflow(value, "float"))
            }
        }
        other => parse_float(&to_text(other), "float"),
    }
}

fn to_double(raw: Value) -> Result<f64, ConversionError> {
    match raw {
        Value::Float64(value) => Ok(value),
        Value::Float32(value) => Ok(f64::from(value)),
        other => parse_float(&to_text(other), "double"),
    }
}

/// Parses a float, reporting finite literals that round to infinity as overflow
fn parse_float<T>(text: &str, type_name: &str) -> Result<T, ConversionError>
where
    T: FromStr<Err = std::num::ParseFloatError> + Into<f64> + Copy,
{
    let trimmed = text.trim();
    let value: T = trimmed
        .parse()
        .map_err(|e: std::num::ParseFloatError| {
            ConversionError::parse(text, type_name, e.to_string())
        })?;

    let parsed: f64 = value.into();
    if parsed.is_infinite() && !trimmed.to_lowercase().contains("inf") {
        return Err(ConversionError::overflow(trimmed, type_name));
    }
    if parsed == 0.0 && has_nonzero_mantissa(trimmed) {
        return Err(ConversionError::overflow(trimmed, type_name));
    }
    Ok(value)
}

/// True when the digits before any exponent are not all zero
fn has_nonzero_mantissa(literal: &str) -> bool {
    literal
        .chars()
        .take_while(|c| !matches!(c, 'e' | 'E'))
        .any(|c| matches!(c, '1'..='9'))
}

fn to_enum(raw: Value, enum_type: &EnumType) -> Result<EnumValue, ConversionError> {
    let name = match raw {
        Value::Enum(value) if value.enum_type() == enum_type => return Ok(value),
        Value::Enum(value) => value.name().to_string(),
        other => to_text(other),
    };

    enum_type.lookup(name.trim()).ok_or_else(|| {
        ConversionError::parse(
            name.as_str(),
            format!("enum {}", enum_type.name()),
            format!("expected one of: [{}]", enum_type.members().join(", ")),
        )
    })
}

fn to_duration(raw: Value) -> Result<Duration, ConversionError> {
    match raw {
        Value::Duration(duration) => Ok(duration),
        other => parse_duration(&to_text(other)),
    }
}

fn to_memory_size(raw: Value) -> Result<MemorySize, ConversionError> {
    match raw {
        Value::MemorySize(size) => Ok(size),
        other => MemorySize::parse(&to_text(other)),
    }
}

fn to_map(raw: Value) -> Result<BTreeMap<String, String>, ConversionError> {
    let text = match raw {
        Value::Map(entries) => return Ok(entries),
        other => to_text(other),
    };

    let mut entries = BTreeMap::new();
    for entry in split_escaped(&text, ',')? {
        let pair = split_escaped(&entry, ':')?;
        let [key, value] = <[String; 2]>::try_from(pair).map_err(|pair| {
            ConversionError::malformed(
                entry.as_str(),
                format!(
                    "map item is not a key-value pair (expected 2 parts separated by ':', found {})",
                    pair.len()
                ),
            )
        })?;
        entries.insert(key, value);
    }
    Ok(entries)
}

/// Elements of a list that is already materialised are still coerced to the
/// element type, which leaves correctly typed elements untouched.
fn to_list(raw: Value, element: &TypeTag) -> Result<Vec<Value>, ConversionError> {
    if let TypeTag::List(_) = element {
        return Err(ConversionError::UnsupportedType {
            tag: TypeTag::list_of(element.clone()).to_string(),
        });
    }

    let items = match raw {
        Value::List(items) => items,
        other => split_escaped(&to_text(other), ',')?
            .into_iter()
            .map(Value::Text)
            .collect(),
    };

    items
        .into_iter()
        .map(|item| coerce(item, element))
        .collect()
}
