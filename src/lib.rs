pub mod config;
pub mod datasource;
mod error;
mod model;

pub use config::{ArConfig, ConfigError, DataSourceConfig, PoolConfig};
pub use datasource::{DataSource, DataSourceRegistry};
pub use error::Error;
pub use model::Model;
