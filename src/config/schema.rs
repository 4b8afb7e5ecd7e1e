//! Typed configuration schema.
//!
//! Mirrors the YAML layout one to one. Unknown keys are rejected at every
//! level; semantic validation beyond what serde can express lives in
//! [`super::loader`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub general: GeneralConfig,
    pub server: ServerConfig,
    pub filtering: FilteringConfig,
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Total timeout for one outbound forward, in seconds.
    pub route_timeout: u64,

    /// Log rotation threshold, e.g. `200mb`. Validated but applied by the
    /// process supervisor, not by this binary.
    pub log_rotation: String,
}

impl GeneralConfig {
    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen host address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Tokio worker thread count
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ServerConfig {
    /// Get the listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_workers() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultAction {
    Drop,
    Pass,
}

impl Default for DefaultAction {
    fn default() -> Self {
        DefaultAction::Drop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    In,
    ContainsAny,
    LessThan,
    GreaterThan,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::In => "in",
            FilterOperator::ContainsAny => "contains_any",
            FilterOperator::LessThan => "less_than",
            FilterOperator::GreaterThan => "greater_than",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilteringConfig {
    /// Verdict applied when the combined rule result is false.
    #[serde(default)]
    pub default_action: DefaultAction,

    pub conditions: FilterConditions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConditions {
    pub logic: LogicOperator,
    pub rules: Vec<FilterRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRule {
    /// Field path in dot notation, e.g. `object.type`.
    pub field: String,

    pub operator: FilterOperator,

    /// Heterogeneous comparison value; its shape is checked against the
    /// operator at load time.
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Field path whose value indexes the mapping table.
    pub field: String,

    /// Ordered value → destination URL table. YAML source order is
    /// preserved and first match wins.
    pub mappings: serde_yaml::Mapping,
}
