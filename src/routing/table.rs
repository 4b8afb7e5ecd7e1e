//! Value-keyed destination lookup.
//!
//! The routing field is resolved from the payload, stringified, and matched
//! against the ordered mapping tables from the configuration. Mappings are
//! evaluated in configuration order and the first key-equal entry wins.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::{ConfigError, RouteConfig};
use crate::fields::FieldPath;

const MAX_MAPPINGS_PER_ROUTE: usize = 100;
const MAX_URL_LEN: usize = 2048;

#[derive(Debug, Clone)]
struct CompiledRoute {
    path: FieldPath,
    mappings: Vec<(String, String)>,
}

/// Diagnostic context for a routing miss.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingContext {
    pub field_path: String,
    pub routing_value: Option<String>,
    pub rules_checked: usize,
}

/// Summary of a successful routing decision.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingSummary {
    pub field_path: String,
    pub matched_value: String,
    pub destination_url: String,
    pub rule_index: usize,
}

#[derive(Debug, Clone)]
pub enum RouteDecision {
    Matched {
        url: String,
        summary: RoutingSummary,
    },
    Unmatched {
        context: RoutingContext,
    },
}

/// Ordered first-match routing table.
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile and validate the routes section. Destination URL rules are
    /// enforced here so the validator and the runtime table can never
    /// disagree.
    pub fn new(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        if routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }

        let mut compiled = Vec::with_capacity(routes.len());
        for (index, route) in routes.iter().enumerate() {
            let path =
                FieldPath::parse(&route.field).map_err(|source| ConfigError::InvalidFieldPath {
                    section: format!("routes[{index}]"),
                    field: route.field.clone(),
                    source,
                })?;

            if route.mappings.is_empty() {
                return Err(ConfigError::EmptyMappings { index });
            }
            if route.mappings.len() > MAX_MAPPINGS_PER_ROUTE {
                return Err(ConfigError::TooManyMappings {
                    index,
                    got: route.mappings.len(),
                    limit: MAX_MAPPINGS_PER_ROUTE,
                });
            }

            let mut mappings = Vec::with_capacity(route.mappings.len());
            for (key, destination) in &route.mappings {
                let key = key
                    .as_str()
                    .ok_or_else(|| ConfigError::NonStringMappingKey {
                        index,
                        key: format!("{key:?}"),
                    })?;
                let destination =
                    destination
                        .as_str()
                        .ok_or_else(|| ConfigError::InvalidDestination {
                            index,
                            key: key.to_string(),
                            reason: "destination must be a URL string".to_string(),
                        })?;
                validate_destination(destination).map_err(|reason| {
                    ConfigError::InvalidDestination {
                        index,
                        key: key.to_string(),
                        reason,
                    }
                })?;
                mappings.push((key.to_string(), destination.to_string()));
            }

            compiled.push(CompiledRoute { path, mappings });
        }

        Ok(Self { routes: compiled })
    }

    /// Select a destination for the payload.
    ///
    /// The diagnostic reports the primary (first) routing field and the
    /// number of mapping tables consulted.
    pub fn select(&self, body: &Value) -> RouteDecision {
        let mut rules_checked = 0;
        let mut primary_value: Option<String> = None;

        for (rule_index, route) in self.routes.iter().enumerate() {
            rules_checked += 1;
            let key = route.path.resolve(body).and_then(lookup_key);
            if rule_index == 0 {
                primary_value = key.clone();
            }
            let Some(key) = key else { continue };

            if let Some((_, url)) = route.mappings.iter().find(|(candidate, _)| *candidate == key) {
                return RouteDecision::Matched {
                    url: url.clone(),
                    summary: RoutingSummary {
                        field_path: route.path.source().to_string(),
                        matched_value: key,
                        destination_url: url.clone(),
                        rule_index,
                    },
                };
            }
        }

        RouteDecision::Unmatched {
            context: RoutingContext {
                field_path: self.routes[0].path.source().to_string(),
                routing_value: primary_value,
                rules_checked,
            },
        }
    }
}

/// Lookup key for a resolved routing value: strings verbatim, numbers and
/// booleans in their canonical JSON lexical form. Other JSON types never
/// match a mapping.
fn lookup_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn validate_destination(destination: &str) -> Result<(), String> {
    if destination.len() > MAX_URL_LEN {
        return Err(format!(
            "URL is {} characters, limit is {MAX_URL_LEN}",
            destination.len()
        ));
    }

    let url = Url::parse(destination).map_err(|err| format!("invalid URL: {err}"))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("scheme must be http or https, got '{other}'")),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL must have a non-empty host".to_string());
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err("URL must not carry userinfo".to_string());
    }

    Ok(())
}
