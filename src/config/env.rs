//! Environment-variable overlay for ArConfig.

use toml::{Table, Value};

/// Applies environment variables with the given prefix onto the merged table.
///
/// `<prefix><sep>A<sep>B=v` sets `a.b = v` (segments lowercased). Values are
/// coerced to the most specific scalar type.
pub fn overlay_env(table: &mut Table, prefix: &str, separator: &str) {
    assert!(!separator.is_empty(), "separator must not be empty");
    let lead = format!("{prefix}{separator}");

    for (key, raw) in std::env::vars() {
        let Some(rest) = key.strip_prefix(&lead) else {
            continue;
        };
        if rest.is_empty() || rest.split(separator).any(str::is_empty) {
            continue;
        }

        let path: Vec<String> = rest.split(separator).map(str::to_lowercase).collect();
        insert_at_path(table, &path, coerce_scalar(&raw));
    }
}

/// Inserts a value at a nested path, creating intermediate tables as needed.
/// A non-table value in the way is replaced.
fn insert_at_path(table: &mut Table, path: &[String], value: Value) {
    let (last, parents) = path.split_last().expect("path is non-empty");

    let mut current = table;
    for segment in parents {
        if !matches!(current.get(segment), Some(Value::Table(_))) {
            current.insert(segment.clone(), Value::Table(Table::new()));
        }
        current = match current.get_mut(segment) {
            Some(Value::Table(t)) => t,
            _ => unreachable!("segment was just made a table"),
        };
    }

    current.insert(last.clone(), value);
}

/// Coerces an environment string to boolean, integer, float, or string.
fn coerce_scalar(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}
