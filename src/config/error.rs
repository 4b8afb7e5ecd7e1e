//! Configuration loading and validation errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::fields::PathError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file {path} is {size} bytes, limit is {limit}")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("configuration file {path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    #[error("invalid YAML configuration{location}: {message}")]
    Yaml { message: String, location: String },

    #[error("general.route_timeout must be between {min} and {max} seconds, got {got}")]
    RouteTimeoutOutOfRange { got: u64, min: u64, max: u64 },

    #[error("general.log_rotation '{got}': {reason}")]
    InvalidLogRotation { got: String, reason: String },

    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("server.port must not be 0")]
    PortZero,

    #[error("server.workers must be at least 1")]
    NoWorkers,

    #[error("server.log_level '{got}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel { got: String },

    #[error("{section}: invalid field path '{field}': {source}")]
    InvalidFieldPath {
        section: String,
        field: String,
        #[source]
        source: PathError,
    },

    #[error("filtering.conditions.rules: rule '{field}': operator {operator} {reason}")]
    InvalidRuleValue {
        field: String,
        operator: String,
        reason: String,
    },

    #[error("filtering.conditions.rules must contain at least one rule")]
    NoFilterRules,

    #[error("routes must contain at least one route mapping")]
    NoRoutes,

    #[error("routes[{index}].mappings must not be empty")]
    EmptyMappings { index: usize },

    #[error("routes[{index}].mappings has {got} entries, limit is {limit}")]
    TooManyMappings {
        index: usize,
        got: usize,
        limit: usize,
    },

    #[error("routes[{index}].mappings: key {key} must be a plain string")]
    NonStringMappingKey { index: usize, key: String },

    #[error("routes[{index}].mappings['{key}']: {reason}")]
    InvalidDestination {
        index: usize,
        key: String,
        reason: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        let location = err
            .location()
            .map(|loc| format!(" at line {}, column {}", loc.line(), loc.column()))
            .unwrap_or_default();
        ConfigError::Yaml {
            message: err.to_string(),
            location,
        }
    }
}
