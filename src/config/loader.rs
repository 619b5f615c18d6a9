use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::env::overlay_env;
use super::resolve::resolve_references;
use super::ConfigError;

/// Pool settings carried by a data source. Settings only; this crate does not
/// open connections.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_idle: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_idle: 0,
            acquire_timeout_ms: 30_000,
        }
    }
}

/// Declaration of a single named data source in ArConfig.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    pub driver: String,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// The ArConfig document: named data sources, an optional default, and
/// per-model bindings.
///
/// ```toml
/// default = "primary"
///
/// [datasource.primary]
/// driver = "postgres"
/// url = "postgres://db.internal:5432/app"
///
/// [datasource.analytics]
/// driver = "clickhouse"
/// url = "tcp://olap.internal:9000"
///
/// [bindings]
/// "com.example.Order" = "analytics"
/// ```
///
/// Keys outside these three sections are ignored by deserialization, so a
/// `[vars]` table can hold values meant only as `${...}` reference targets.
#[derive(Debug, Clone, Deserialize)]
pub struct ArConfig {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub datasource: BTreeMap<String, DataSourceConfig>,
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl ArConfig {
    /// Creates a builder for loading ArConfig from layered sources.
    pub fn builder() -> ArConfigBuilder {
        ArConfigBuilder::default()
    }
}

#[derive(Debug)]
enum Layer {
    File { path: PathBuf, required: bool },
    Env { prefix: String, separator: String },
}

/// Builder for loading ArConfig from TOML files and environment variables.
///
/// Layers are applied in registration order, with later layers overriding
/// earlier ones. Nested tables merge recursively; scalars and arrays are
/// replaced entirely.
///
/// String values may reference other config values with `${path.to.field}`
/// syntax (use `$$` for a literal `$`); references are resolved after all
/// layers are merged.
///
/// ```no_run
/// use ar_config::ArConfig;
///
/// let config = ArConfig::builder()
///     .with_file("config/ar.toml", true)
///     .with_env("AR", "__")
///     .with_file("config/ar.local.toml", false)
///     .load()?;
/// # Ok::<(), ar_config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .load() is called"]
pub struct ArConfigBuilder {
    layers: Vec<Layer>,
}

impl ArConfigBuilder {
    /// Adds a TOML file layer.
    ///
    /// If `required` is `true`, loading fails when the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds an environment-variable layer.
    ///
    /// Variables named `<prefix><sep><SEGMENT><sep><SEGMENT>...` map to nested
    /// config paths with segments lowercased, e.g. with prefix `AR` and
    /// separator `__`, `AR__DATASOURCE__PRIMARY__URL` sets
    /// `datasource.primary.url`. Values are coerced to the most specific of
    /// boolean, integer, float, or string.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.layers.push(Layer::Env {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    /// Loads, merges, resolves, and deserializes the configuration.
    pub fn load(self) -> Result<ArConfig, ConfigError> {
        let mut merged = toml::Table::new();

        for layer in self.layers {
            match layer {
                Layer::File { path, required } => {
                    if let Some(table) = read_toml_file(&path, required)? {
                        deep_merge(&mut merged, table);
                    }
                }
                Layer::Env { prefix, separator } => {
                    overlay_env(&mut merged, &prefix, &separator);
                }
            }
        }

        // References may span layers, so resolve only once everything is merged.
        resolve_references(&mut merged)?;

        toml::Value::Table(merged)
            .try_into()
            .map_err(ConfigError::Deserialize)
    }
}

/// Reads and parses one TOML file.
///
/// Returns `Ok(None)` when the file is absent and not required.
fn read_toml_file(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_single_file_load() {
        let file = write_toml(
            r#"
            default = "primary"

            [datasource.primary]
            driver = "postgres"
            url = "postgres://db.internal:5432/app"
            "#,
        );

        let config = ArConfig::builder()
            .with_file(file.path(), true)
            .load()
            .unwrap();

        assert_eq!(config.default.as_deref(), Some("primary"));
        let ds = &config.datasource["primary"];
        assert_eq!(ds.driver, "postgres");
        assert_eq!(ds.url, "postgres://db.internal:5432/app");
        assert_eq!(ds.pool, PoolConfig::default());
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let base = write_toml(
            r#"
            [datasource.primary]
            driver = "postgres"
            url = "postgres://db.internal:5432/app"

            [datasource.primary.pool]
            max_connections = 5
            "#,
        );
        let local = write_toml(
            r#"
            [datasource.primary]
            url = "postgres://localhost:5432/app_dev"
            "#,
        );

        let config = ArConfig::builder()
            .with_file(base.path(), true)
            .with_file(local.path(), false)
            .load()
            .unwrap();

        let ds = &config.datasource["primary"];
        // Overridden by the local layer.
        assert_eq!(ds.url, "postgres://localhost:5432/app_dev");
        // Untouched keys survive the merge.
        assert_eq!(ds.driver, "postgres");
        assert_eq!(ds.pool.max_connections, 5);
    }

    #[test]
    fn test_required_file_missing_fails() {
        let result = ArConfig::builder()
            .with_file("/nonexistent/ar.toml", true)
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_optional_file_missing_is_skipped() {
        let config = ArConfig::builder()
            .with_file("/nonexistent/ar.toml", false)
            .load()
            .unwrap();
        assert!(config.datasource.is_empty());
        assert!(config.default.is_none());
    }

    #[test]
    fn test_references_resolve_across_layers() {
        let base = write_toml(
            r#"
            [vars]
            host = "db.internal"

            [datasource.primary]
            driver = "postgres"
            url = "postgres://${vars.host}:${vars.port}/app"
            "#,
        );
        let local = write_toml(
            r#"
            [vars]
            port = 5433
            "#,
        );

        let config = ArConfig::builder()
            .with_file(base.path(), true)
            .with_file(local.path(), true)
            .load()
            .unwrap();

        assert_eq!(
            config.datasource["primary"].url,
            "postgres://db.internal:5433/app"
        );
    }

    #[test]
    fn test_bindings_section() {
        let file = write_toml(
            r#"
            [datasource.analytics]
            driver = "clickhouse"
            url = "tcp://olap.internal:9000"

            [bindings]
            "com.example.Order" = "analytics"
            "#,
        );

        let config = ArConfig::builder()
            .with_file(file.path(), true)
            .load()
            .unwrap();

        assert_eq!(config.bindings["com.example.Order"], "analytics");
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let file = write_toml("datasource = [broken");
        let result = ArConfig::builder().with_file(file.path(), true).load();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_required_field_reports_deserialize_error() {
        // url is mandatory for a data source.
        let file = write_toml(
            r#"
            [datasource.primary]
            driver = "postgres"
            "#,
        );
        let result = ArConfig::builder().with_file(file.path(), true).load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }
}
