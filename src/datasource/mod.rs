//! Data-source descriptors and the model-to-source registry.

use std::collections::BTreeMap;

use crate::config::{ArConfig, DataSourceConfig, PoolConfig};
use crate::error::Error;
use crate::model::Model;

/// An immutable descriptor of one configured data source.
///
/// This is configuration data only; opening connections and pooling are the
/// consuming driver's job.
#[derive(Debug, Clone)]
pub struct DataSource {
    name: String,
    driver: String,
    url: String,
    username: Option<String>,
    password: Option<String>,
    pool: PoolConfig,
}

impl DataSource {
    /// Creates a descriptor for programmatic registration.
    pub fn new(
        name: impl Into<String>,
        driver: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            url: url.into(),
            username: None,
            password: None,
            pool: PoolConfig::default(),
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    fn from_config(name: &str, config: &DataSourceConfig) -> Self {
        Self {
            name: name.to_string(),
            driver: config.driver.clone(),
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            pool: config.pool.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }
}

/// Registry mapping model types to configured data sources.
///
/// Lookup order: the model's explicit binding, then the default data source.
/// A model with neither resolves to [`Error::DataSourceNotFound`] carrying the
/// model's canonical name; that result means "definitely unbound", never
/// "transiently unavailable".
///
/// ```no_run
/// use ar_config::{ArConfig, DataSourceRegistry, Model};
///
/// struct User;
/// impl Model for User {}
///
/// let config = ArConfig::builder()
///     .with_file("config/ar.toml", true)
///     .load()?;
/// let registry = DataSourceRegistry::from_config(config)?;
///
/// let ds = registry.datasource_for::<User>()?;
/// println!("{} -> {}", ds.name(), ds.url());
/// # Ok::<(), ar_config::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct DataSourceRegistry {
    sources: BTreeMap<String, DataSource>,
    bindings: BTreeMap<String, String>,
    default: Option<String>,
}

impl DataSourceRegistry {
    /// Creates an empty registry for programmatic setup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes a registry from a loaded ArConfig.
    ///
    /// Fails with [`Error::UnknownDataSource`] if the default or any binding
    /// names a data source the config does not define, so a successfully
    /// built registry can only resolve to existing sources.
    pub fn from_config(config: ArConfig) -> Result<Self, Error> {
        let sources: BTreeMap<String, DataSource> = config
            .datasource
            .iter()
            .map(|(name, ds)| (name.clone(), DataSource::from_config(name, ds)))
            .collect();

        if let Some(name) = &config.default {
            if !sources.contains_key(name) {
                return Err(Error::UnknownDataSource {
                    name: name.clone(),
                    referrer: "default".to_string(),
                });
            }
        }
        for (model, source) in &config.bindings {
            if !sources.contains_key(source) {
                return Err(Error::UnknownDataSource {
                    name: source.clone(),
                    referrer: format!("binding for {model}"),
                });
            }
        }

        Ok(Self {
            sources,
            bindings: config.bindings,
            default: config.default,
        })
    }

    /// Registers a data source, replacing any source with the same name.
    pub fn register(&mut self, source: DataSource) {
        self.sources.insert(source.name().to_string(), source);
    }

    /// Binds a model type to a registered data source.
    pub fn bind<M: Model>(&mut self, source_name: &str) -> Result<(), Error> {
        self.bind_named(M::model_name(), source_name)
    }

    /// Binds a model by canonical name to a registered data source.
    pub fn bind_named(
        &mut self,
        model_name: impl Into<String>,
        source_name: &str,
    ) -> Result<(), Error> {
        let model_name = model_name.into();
        if !self.sources.contains_key(source_name) {
            return Err(Error::UnknownDataSource {
                name: source_name.to_string(),
                referrer: format!("binding for {model_name}"),
            });
        }
        self.bindings.insert(model_name, source_name.to_string());
        Ok(())
    }

    /// Sets the default data source used by models without an explicit binding.
    pub fn set_default(&mut self, source_name: &str) -> Result<(), Error> {
        if !self.sources.contains_key(source_name) {
            return Err(Error::UnknownDataSource {
                name: source_name.to_string(),
                referrer: "default".to_string(),
            });
        }
        self.default = Some(source_name.to_string());
        Ok(())
    }

    /// Resolves the data source for a model type.
    pub fn datasource_for<M: Model>(&self) -> Result<&DataSource, Error> {
        self.lookup(&M::model_name())
    }

    /// Resolves the data source for a model by canonical name.
    pub fn lookup(&self, model_name: &str) -> Result<&DataSource, Error> {
        let source_name = self
            .bindings
            .get(model_name)
            .or(self.default.as_ref())
            .ok_or_else(|| Error::datasource_not_found_named(model_name))?;

        // Bindings and the default are validated on insertion, so the source
        // must exist.
        self.sources
            .get(source_name)
            .ok_or_else(|| Error::datasource_not_found_named(model_name))
    }
}
