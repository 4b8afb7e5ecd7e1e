//! Response body types for the HTTP surface.

use serde::Serialize;

use crate::config::Config;
use crate::filter::FilteringSummary;
use crate::pipeline::{DestinationResponse, ForwardingContext};
use crate::routing::{RoutingContext, RoutingSummary};

/// A request rejected by filtering. Not an error: the document was received
/// and processed, the verdict was "drop".
#[derive(Debug, Clone, Serialize)]
pub struct DroppedResponse {
    pub status: &'static str,
    pub result: &'static str,
    pub request_id: String,
    pub filtering_summary: FilteringSummary,
}

impl DroppedResponse {
    pub fn new(request_id: String, filtering_summary: FilteringSummary) -> Self {
        Self {
            status: "processed",
            result: "dropped",
            request_id,
            filtering_summary,
        }
    }
}

/// A successfully forwarded request with the upstream response attached.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedResponse {
    pub status: &'static str,
    pub request_id: String,
    pub routing_summary: RoutingSummary,
    pub destination_response: DestinationResponse,
}

impl RoutedResponse {
    pub fn new(
        request_id: String,
        routing_summary: RoutingSummary,
        destination_response: DestinationResponse,
    ) -> Self {
        Self {
            status: "routed",
            request_id,
            routing_summary,
            destination_response,
        }
    }
}

/// Error envelope shared by every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_context: Option<RoutingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarding_context: Option<ForwardingContext>,
}

impl ErrorResponse {
    pub fn new(error: &'static str, message: impl Into<String>, request_id: String) -> Self {
        Self {
            error,
            message: message.into(),
            request_id,
            routing_context: None,
            forwarding_context: None,
        }
    }

    pub fn with_routing_context(mut self, context: RoutingContext) -> Self {
        self.routing_context = Some(context);
        self
    }

    pub fn with_forwarding_context(mut self, context: ForwardingContext) -> Self {
        self.forwarding_context = Some(context);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse<'a> {
    pub config: &'a Config,
    pub request_id: String,
}
