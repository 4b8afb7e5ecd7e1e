//! Predicate evaluation over decoded payloads.
//!
//! Rules are compiled once from the configuration into operator-specific
//! payload variants, so evaluation does no type dispatch beyond variant
//! selection. Evaluation never errors: a type mismatch against the live
//! payload is a non-match.

use serde::Serialize;
use serde_json::Value;

use crate::config::{
    ConfigError, DefaultAction, FilterOperator, FilterRule, FilteringConfig, LogicOperator,
};
use crate::fields::FieldPath;

const MAX_LIST_ITEMS: usize = 100;

/// A rule's comparison payload, shaped by its operator.
#[derive(Debug, Clone)]
enum Predicate {
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    ContainsAny(Vec<Value>),
    LessThan(f64),
    GreaterThan(f64),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    path: FieldPath,
    predicate: Predicate,
}

impl CompiledRule {
    fn compile(rule: &FilterRule) -> Result<Self, ConfigError> {
        let path =
            FieldPath::parse(&rule.field).map_err(|source| ConfigError::InvalidFieldPath {
                section: "filtering.conditions.rules".to_string(),
                field: rule.field.clone(),
                source,
            })?;

        let invalid = |reason: &str| ConfigError::InvalidRuleValue {
            field: rule.field.clone(),
            operator: rule.operator.as_str().to_string(),
            reason: reason.to_string(),
        };

        let predicate = match rule.operator {
            FilterOperator::Equals => {
                require_scalar(&rule.value).map_err(|r| invalid(r))?;
                Predicate::Equals(rule.value.clone())
            }
            FilterOperator::NotEquals => {
                require_scalar(&rule.value).map_err(|r| invalid(r))?;
                Predicate::NotEquals(rule.value.clone())
            }
            FilterOperator::In => Predicate::In(require_scalar_list(&rule.value).map_err(|r| invalid(r))?),
            FilterOperator::ContainsAny => {
                Predicate::ContainsAny(require_scalar_list(&rule.value).map_err(|r| invalid(r))?)
            }
            FilterOperator::LessThan => {
                Predicate::LessThan(require_number(&rule.value).map_err(|r| invalid(r))?)
            }
            FilterOperator::GreaterThan => {
                Predicate::GreaterThan(require_number(&rule.value).map_err(|r| invalid(r))?)
            }
        };

        Ok(Self { path, predicate })
    }

    fn matches(&self, body: &Value) -> bool {
        let resolved = self.path.resolve(body);
        match (&self.predicate, resolved) {
            (Predicate::Equals(expected), Some(value)) => json_eq(value, expected),
            (Predicate::Equals(_), None) => false,
            (Predicate::NotEquals(expected), Some(value)) => !json_eq(value, expected),
            (Predicate::NotEquals(_), None) => true,
            (Predicate::In(candidates), Some(value)) => {
                candidates.iter().any(|candidate| json_eq(value, candidate))
            }
            (Predicate::ContainsAny(candidates), Some(Value::Array(items))) => items
                .iter()
                .any(|item| candidates.iter().any(|candidate| json_eq(item, candidate))),
            (Predicate::LessThan(limit), Some(value)) => {
                value.as_f64().is_some_and(|number| number < *limit)
            }
            (Predicate::GreaterThan(limit), Some(value)) => {
                value.as_f64().is_some_and(|number| number > *limit)
            }
            _ => false,
        }
    }
}

/// Deep equality with numeric cross-kind comparison: `5` equals `5.0`.
fn json_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn require_scalar(value: &Value) -> Result<(), &'static str> {
    if value.is_array() || value.is_object() {
        Err("requires a scalar value")
    } else {
        Ok(())
    }
}

fn require_scalar_list(value: &Value) -> Result<Vec<Value>, &'static str> {
    let items = value.as_array().ok_or("requires a list value")?;
    if items.is_empty() {
        return Err("requires a non-empty list");
    }
    if items.len() > MAX_LIST_ITEMS {
        return Err("list has more than 100 items");
    }
    if items.iter().any(|item| item.is_array() || item.is_object()) {
        return Err("list items must be scalars");
    }
    Ok(items.clone())
}

fn require_number(value: &Value) -> Result<f64, &'static str> {
    value.as_f64().ok_or("requires a numeric value")
}

/// Summary of one filtering decision, surfaced in responses and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteringSummary {
    pub rules_evaluated: usize,
    pub default_action_applied: bool,
    pub matched_rules: Option<Vec<String>>,
}

/// Outcome of evaluating a payload against the configured conditions.
#[derive(Debug, Clone)]
pub struct FilterVerdict {
    pub admitted: bool,
    pub summary: FilteringSummary,
}

/// Evaluates payloads against the configured rule set.
pub struct FilterEngine {
    default_action: DefaultAction,
    logic: LogicOperator,
    rules: Vec<CompiledRule>,
}

impl FilterEngine {
    /// Compile the filtering section. Rule typing errors surface here, so
    /// the validator and the runtime engine can never disagree.
    pub fn new(config: &FilteringConfig) -> Result<Self, ConfigError> {
        if config.conditions.rules.is_empty() {
            return Err(ConfigError::NoFilterRules);
        }

        let rules = config
            .conditions
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            default_action: config.default_action,
            logic: config.conditions.logic,
            rules,
        })
    }

    /// Evaluate the payload. AND short-circuits on the first non-match, OR
    /// on the first match; rules run in configuration order.
    pub fn evaluate(&self, body: &Value) -> FilterVerdict {
        let mut matched_rules = Vec::new();
        let mut rules_evaluated = 0;
        let mut combined = matches!(self.logic, LogicOperator::And);

        for rule in &self.rules {
            rules_evaluated += 1;
            let hit = rule.matches(body);
            if hit {
                matched_rules.push(rule.path.source().to_string());
            }
            match self.logic {
                LogicOperator::And if !hit => {
                    combined = false;
                    break;
                }
                LogicOperator::Or if hit => {
                    combined = true;
                    break;
                }
                _ => {}
            }
        }

        let admitted = combined || self.default_action == DefaultAction::Pass;

        FilterVerdict {
            admitted,
            summary: FilteringSummary {
                rules_evaluated,
                default_action_applied: !combined,
                matched_rules: if matched_rules.is_empty() {
                    None
                } else {
                    Some(matched_rules)
                },
            },
        }
    }
}
