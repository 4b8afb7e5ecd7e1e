//! YAML configuration: schema, loading, validation.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::{load, validate, MAX_CONFIG_BYTES};
pub use schema::{
    Config, DefaultAction, FilterConditions, FilterOperator, FilterRule, FilteringConfig,
    GeneralConfig, LogicOperator, RouteConfig, ServerConfig,
};
