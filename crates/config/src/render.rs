//! Canonical text form of typed values
//!
//! [`render`] is the only place that turns typed values back into text.
//! Its output is what the coercer reads, so `coerce(render(v), tag) == v`.

use crate::splitter::escape_with_single_quote;
use types::{utils::format_with_highest_unit, Value, SECRET_MASK};

const LIST_DELIMITER: char = ',';
const KEY_VALUE_DELIMITER: char = ':';

/// Render a value in its canonical delimited form.
///
/// Secrets are rendered as their literal; use [`render_for_display`] for
/// anything that ends up in logs or terminal output.
pub fn render(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Secret(password) => password.expose().to_string(),
        Value::Duration(duration) => format_with_highest_unit(*duration),
        Value::List(elements) => join_list(elements, render),
        Value::Map(entries) => entries
            .iter()
            .map(|(key, value)| {
                let pair = format!(
                    "{}{}{}",
                    escape_with_single_quote(key, &[KEY_VALUE_DELIMITER]),
                    KEY_VALUE_DELIMITER,
                    escape_with_single_quote(value, &[KEY_VALUE_DELIMITER]),
                );
                escape_with_single_quote(&pair, &[LIST_DELIMITER])
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Int32(_)
        | Value::Int64(_)
        | Value::Bool(_)
        | Value::Float32(_)
        | Value::Float64(_)
        | Value::Enum(_)
        | Value::MemorySize(_) => value.to_string(),
    }
}

/// Same as [`render`] with every secret replaced by the mask
pub fn render_for_display(value: &Value) -> String {
    match value {
        Value::Secret(_) => SECRET_MASK.to_string(),
        Value::List(elements) => join_list(elements, render_for_display),
        other => render(other),
    }
}

fn join_list(elements: &[Value], render_element: fn(&Value) -> String) -> String {
    elements
        .iter()
        .map(|element| escape_with_single_quote(&render_element(element), &[LIST_DELIMITER]))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeMap, time::Duration};
    use types::{EnumType, MemorySize, Password};

    fn texts(items: &[&str]) -> Value {
        Value::List(items.iter().map(|&item| Value::from(item)).collect())
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render(&Value::Int32(-7)), "-7");
        assert_eq!(render(&Value::Int64(5_000_000_000)), "5000000000");
        assert_eq!(render(&Value::Bool(true)), "true");
        assert_eq!(render(&Value::Float32(1.5)), "1.5");
        assert_eq!(render(&Value::Float64(0.1)), "0.1");
        assert_eq!(render(&Value::from("as is, really")), "as is, really");
        assert_eq!(render(&Value::MemorySize(MemorySize::from_mebibytes(64))), "64 mb");

        let level = EnumType::new("Level", &["LOW", "HIGH"]).lookup("high").unwrap();
        assert_eq!(render(&Value::Enum(level)), "HIGH");
    }

    #[test]
    fn test_render_duration_uses_highest_unit() {
        assert_eq!(render(&Value::Duration(Duration::from_secs(300))), "5 min");
        assert_eq!(render(&Value::Duration(Duration::from_millis(1500))), "1500 ms");
    }

    #[test]
    fn test_render_list() {
        assert_eq!(render(&texts(&["a", "b", "c"])), "a,b,c");
        assert_eq!(render(&texts(&["a,b", "c"])), "'a,b',c");
        assert_eq!(render(&texts(&[])), "");
        assert_eq!(
            render(&Value::List(vec![
                Value::Duration(Duration::from_secs(60)),
                Value::Duration(Duration::from_secs(1)),
            ])),
            "1 min,1 s"
        );
    }

    #[test]
    fn test_render_map() {
        let mut entries = BTreeMap::new();
        entries.insert("k1".to_string(), "v1".to_string());
        entries.insert("k2".to_string(), "v2".to_string());
        assert_eq!(render(&Value::Map(entries)), "k1:v1,k2:v2");

        let mut entries = BTreeMap::new();
        entries.insert("host:port".to_string(), "a,b".to_string());
        assert_eq!(render(&Value::Map(entries)), "'''host:port'':a,b'");
    }

    #[test]
    fn test_secret_rendering() {
        let value = Value::List(vec![
            Value::Secret(Password::new("s3cr,et")),
            Value::from("public"),
        ]);
        assert_eq!(render(&value), "'s3cr,et',public");
        assert_eq!(render_for_display(&value), "******,public");
        assert_eq!(
            render_for_display(&Value::Secret(Password::new("hunter2"))),
            SECRET_MASK
        );
    }
}
