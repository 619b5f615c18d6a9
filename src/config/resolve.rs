//! `${path.to.field}` reference resolution over the merged config table.
//!
//! References are resolved to fixpoint after all layers are merged, so a
//! data-source URL can be assembled from values supplied by any layer. `$$`
//! escapes a literal `$`.

use super::ConfigError;
use toml::{Table, Value};

// Fixpoint bound; a chain deeper than this is treated as circular.
const MAX_PASSES: usize = 100;

/// Resolves all references in the table, erroring on cycles, unknown paths,
/// and references to non-scalar values.
pub fn resolve_references(table: &mut Table) -> Result<(), ConfigError> {
    for _ in 0..MAX_PASSES {
        let snapshot = table.clone();
        if rewrite_table(table, &snapshot)? == 0 {
            return Ok(());
        }
    }
    Err(ConfigError::CircularReference)
}

fn rewrite_table(table: &mut Table, root: &Table) -> Result<usize, ConfigError> {
    let mut count = 0;
    for (_, value) in table.iter_mut() {
        count += rewrite_value(value, root)?;
    }
    Ok(count)
}

fn rewrite_value(value: &mut Value, root: &Table) -> Result<usize, ConfigError> {
    match value {
        Value::String(s) => rewrite_string(s, root),
        Value::Table(t) => rewrite_table(t, root),
        Value::Array(items) => {
            let mut count = 0;
            for item in items.iter_mut() {
                count += rewrite_value(item, root)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

/// Substitutes every `${...}` in one string, honoring `$$` escapes.
/// Returns the number of substitutions made.
fn rewrite_string(s: &mut String, root: &Table) -> Result<usize, ConfigError> {
    if !s.contains('$') {
        return Ok(0);
    }

    let mut out = String::with_capacity(s.len());
    let mut substitutions = 0;
    let mut rest = s.as_str();

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(after) = tail.strip_prefix('$') {
            out.push('$');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{') {
            let end = after.find('}').ok_or(ConfigError::UnclosedReference)?;
            out.push_str(&lookup_scalar(root, &after[..end])?);
            substitutions += 1;
            rest = &after[end + 1..];
        } else {
            out.push('$');
            rest = tail;
        }
    }
    out.push_str(rest);

    *s = out;
    Ok(substitutions)
}

/// Resolves a dotted path against the root table and renders it as a string.
fn lookup_scalar(root: &Table, path: &str) -> Result<String, ConfigError> {
    let not_found = || ConfigError::UnknownReference(path.to_string());

    let mut current: Option<&Value> = None;
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(not_found());
        }
        current = match current {
            None => root.get(segment),
            Some(value) => value.as_table().and_then(|t| t.get(segment)),
        };
        if current.is_none() {
            return Err(not_found());
        }
    }

    match current.ok_or_else(not_found)? {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => {
            Err(ConfigError::NonScalarReference(path.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(toml_str: &str) -> Table {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_url_assembled_from_references() {
        let mut table = make_table(
            r#"
            [vars]
            host = "db.internal"
            port = 5432

            [datasource.primary]
            url = "postgres://${vars.host}:${vars.port}/app"
            "#,
        );
        resolve_references(&mut table).unwrap();
        assert_eq!(
            table["datasource"]["primary"]["url"].as_str().unwrap(),
            "postgres://db.internal:5432/app"
        );
    }

    #[test]
    fn test_chained_references() {
        let mut table = make_table(
            r#"
            a = "olap"
            b = "${a}.internal"
            c = "tcp://${b}:9000"
            "#,
        );
        resolve_references(&mut table).unwrap();
        assert_eq!(table["c"].as_str().unwrap(), "tcp://olap.internal:9000");
    }

    #[test]
    fn test_escape_and_lone_dollar() {
        let mut table = make_table(
            r#"
            a = "pass$$word"
            b = "cost is 5$"
            "#,
        );
        resolve_references(&mut table).unwrap();
        assert_eq!(table["a"].as_str().unwrap(), "pass$word");
        assert_eq!(table["b"].as_str().unwrap(), "cost is 5$");
    }

    #[test]
    fn test_references_inside_arrays() {
        let mut table = make_table(
            r#"
            base = "replica"
            names = ["${base}-1", "${base}-2"]
            "#,
        );
        resolve_references(&mut table).unwrap();
        let names = table["names"].as_array().unwrap();
        assert_eq!(names[0].as_str().unwrap(), "replica-1");
        assert_eq!(names[1].as_str().unwrap(), "replica-2");
    }

    #[test]
    fn test_circular_reference_detected() {
        let mut table = make_table(
            r#"
            a = "${b}"
            b = "${a}"
            "#,
        );
        assert!(matches!(
            resolve_references(&mut table),
            Err(ConfigError::CircularReference)
        ));
    }

    #[test]
    fn test_unknown_reference() {
        let mut table = make_table(r#"url = "${datasource.missing.url}""#);
        assert!(matches!(
            resolve_references(&mut table),
            Err(ConfigError::UnknownReference(_))
        ));
    }

    #[test]
    fn test_non_scalar_reference() {
        let mut table = make_table(
            r#"
            [datasource.primary]
            url = "x"
            copy = "${datasource.primary}"
            "#,
        );
        assert!(matches!(
            resolve_references(&mut table),
            Err(ConfigError::NonScalarReference(_))
        ));
    }

    #[test]
    fn test_unclosed_reference() {
        let mut table = make_table(r#"url = "${datasource.primary.url""#);
        assert!(matches!(
            resolve_references(&mut table),
            Err(ConfigError::UnclosedReference)
        ));
    }
}
