//! ArConfig: layered configuration of data sources and model bindings.

mod env;
mod error;
mod loader;
mod resolve;

pub use error::ConfigError;
pub use loader::{ArConfig, ArConfigBuilder, DataSourceConfig, PoolConfig};
