//! Request processing pipeline: validate → filter → route → forward.
//!
//! Each stage either advances or terminates with a typed outcome; the HTTP
//! layer maps outcomes to status codes and bodies. Every completed stage
//! emits exactly one summary log line keyed on the request ID, and the
//! decoded body is never mutated on its way through.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::context::RequestContext;
use crate::filter::{FilterEngine, FilteringSummary};
use crate::forward::{ForwardOutcome, Forwarder};
use crate::logging;
use crate::routing::{RouteDecision, RouteTable, RoutingContext, RoutingSummary};

/// Upstream response surfaced verbatim to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DestinationResponse {
    pub status_code: u16,
    pub content: Value,
}

/// Forwarding failure diagnostics included in error responses.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardingContext {
    pub error_type: String,
    pub destination_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardErrorKind {
    Timeout,
    Connection,
    BadResponse,
}

impl ForwardErrorKind {
    pub fn error_type(&self) -> &'static str {
        match self {
            ForwardErrorKind::Timeout => "TIMEOUT_ERROR",
            ForwardErrorKind::Connection => "CONNECTION_ERROR",
            ForwardErrorKind::BadResponse => "BAD_RESPONSE_ERROR",
        }
    }
}

/// Terminal result of one trip through the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Body was not JSON, or not a JSON object.
    Invalid { message: String },

    /// Rejected by filtering; not an error.
    Dropped { filtering_summary: FilteringSummary },

    /// Admitted but no route mapping matched.
    Unroutable { context: RoutingContext },

    /// The forward attempt failed at the transport level.
    ForwardFailed {
        kind: ForwardErrorKind,
        message: String,
        context: ForwardingContext,
    },

    /// Forwarded; upstream status and body surfaced verbatim.
    Routed {
        routing_summary: RoutingSummary,
        destination_response: DestinationResponse,
    },
}

/// Orchestrates the four stages over the immutable configuration.
pub struct Pipeline {
    filter: FilterEngine,
    routes: RouteTable,
    forwarder: Forwarder,
}

impl Pipeline {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            filter: FilterEngine::new(&config.filtering)?,
            routes: RouteTable::new(&config.routes)?,
            forwarder: Forwarder::new(config.general.route_timeout())?,
        })
    }

    /// Run one request through the pipeline.
    pub async fn process(&self, ctx: &RequestContext, raw_body: &[u8]) -> PipelineOutcome {
        let request_id = ctx.request_id.to_string();

        let body: Value = match serde_json::from_slice(raw_body) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    category = logging::CATEGORY_VALIDATION_ERROR,
                    request_id = %request_id,
                    error = %err,
                    "Request body is not valid JSON"
                );
                return PipelineOutcome::Invalid {
                    message: format!("Invalid JSON payload: {err}"),
                };
            }
        };

        if !body.is_object() {
            warn!(
                category = logging::CATEGORY_VALIDATION_ERROR,
                request_id = %request_id,
                "Payload must be a JSON object"
            );
            return PipelineOutcome::Invalid {
                message: "Payload must be a JSON object".to_string(),
            };
        }

        let verdict = self.filter.evaluate(&body);
        info!(
            category = logging::CATEGORY_FILTERING,
            request_id = %request_id,
            admitted = verdict.admitted,
            rules_evaluated = verdict.summary.rules_evaluated as u64,
            default_action_applied = verdict.summary.default_action_applied,
            "Filtering decision made"
        );
        if !verdict.admitted {
            return PipelineOutcome::Dropped {
                filtering_summary: verdict.summary,
            };
        }

        let (url, routing_summary) = match self.routes.select(&body) {
            RouteDecision::Matched { url, summary } => {
                info!(
                    category = logging::CATEGORY_ROUTING,
                    request_id = %request_id,
                    field_path = %summary.field_path,
                    matched_value = %summary.matched_value,
                    destination_url = %summary.destination_url,
                    rule_index = summary.rule_index as u64,
                    "Routing decision made"
                );
                (url, summary)
            }
            RouteDecision::Unmatched { context } => {
                warn!(
                    category = logging::CATEGORY_ROUTING,
                    request_id = %request_id,
                    field_path = %context.field_path,
                    routing_value = context.routing_value.as_deref().unwrap_or("null"),
                    rules_checked = context.rules_checked as u64,
                    "No matching routing rule found"
                );
                return PipelineOutcome::Unroutable { context };
            }
        };

        match self.forwarder.forward(&url, &body, ctx.request_id).await {
            ForwardOutcome::Ok {
                status_code,
                content,
            } => {
                info!(
                    category = logging::CATEGORY_FORWARDING,
                    request_id = %request_id,
                    destination_url = %url,
                    status_code = status_code as u64,
                    "Request forwarded"
                );
                PipelineOutcome::Routed {
                    routing_summary,
                    destination_response: DestinationResponse {
                        status_code,
                        content,
                    },
                }
            }
            ForwardOutcome::Timeout { elapsed } => {
                let message = format!(
                    "Forwarding timed out after {:.3}s",
                    elapsed.as_secs_f64()
                );
                self.forward_failure(&request_id, &url, ForwardErrorKind::Timeout, message)
            }
            ForwardOutcome::ConnectionError { reason } => self.forward_failure(
                &request_id,
                &url,
                ForwardErrorKind::Connection,
                format!("Connection error: {reason}"),
            ),
            ForwardOutcome::BadResponse { reason } => self.forward_failure(
                &request_id,
                &url,
                ForwardErrorKind::BadResponse,
                format!("Bad upstream response: {reason}"),
            ),
        }
    }

    fn forward_failure(
        &self,
        request_id: &str,
        url: &str,
        kind: ForwardErrorKind,
        message: String,
    ) -> PipelineOutcome {
        error!(
            category = logging::CATEGORY_FORWARDING,
            request_id = %request_id,
            destination_url = %url,
            error_type = kind.error_type(),
            error = %message,
            "Request forwarding failed"
        );
        PipelineOutcome::ForwardFailed {
            kind,
            context: ForwardingContext {
                error_type: kind.error_type().to_string(),
                destination_url: url.to_string(),
            },
            message,
        }
    }
}
