use crate::config::ConfigError;
use crate::model::Model;
use thiserror::Error;

/// Top-level error type for the ar-config library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No data source is configured for the named model type.
    ///
    /// This is a terminal, descriptive signal: the model is definitely
    /// unbound, not transiently unavailable. Any fallback or retry is the
    /// caller's decision.
    #[error("DataSource not found. ArConfig error. Model class is {model}")]
    DataSourceNotFound { model: String },

    /// A binding or default refers to a data source that is not defined.
    #[error("unknown data source '{name}' referenced by {referrer}")]
    UnknownDataSource { name: String, referrer: String },
}

impl Error {
    /// Builds the unresolved-data-source signal for a model type.
    ///
    /// The message embeds the model's canonical (fully-qualified) name and is
    /// deterministic for a given type. Construction performs no I/O and no
    /// logging.
    pub fn datasource_not_found<M: Model>() -> Self {
        Self::datasource_not_found_named(M::model_name())
    }

    /// Same signal, for callers that carry the canonical model name as a
    /// string rather than a type parameter.
    pub fn datasource_not_found_named(model: impl Into<String>) -> Self {
        Error::DataSourceNotFound {
            model: model.into(),
        }
    }
}
