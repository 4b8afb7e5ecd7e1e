//! HTTP request handlers.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{SecondsFormat, Utc};
use futures_util::FutureExt;
use tracing::{error, info};

use super::types::{
    ConfigResponse, DroppedResponse, ErrorResponse, HealthResponse, RoutedResponse,
};
use super::AppState;
use crate::context::RequestContext;
use crate::logging;
use crate::pipeline::{ForwardErrorKind, PipelineOutcome};

/// `POST /webhook` — run the payload through the processing pipeline.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let request_id = ctx.request_id.to_string();

    // catch_unwind turns an uncaught fault into a 500 that still carries
    // the request ID; the future itself stays cancellable on disconnect.
    let outcome = AssertUnwindSafe(state.pipeline.process(&ctx, &body))
        .catch_unwind()
        .await;

    let response = match outcome {
        Ok(outcome) => outcome_response(outcome, &request_id),
        Err(_) => {
            error!(
                category = logging::CATEGORY_SERVER,
                request_id = %request_id,
                "Unexpected fault while processing webhook request"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "InternalError",
                    "An unexpected error occurred during processing",
                    request_id.clone(),
                )),
            )
                .into_response()
        }
    };

    info!(
        category = logging::CATEGORY_RESPONSE,
        request_id = %request_id,
        status_code = response.status().as_u16() as u64,
        "Response dispatched"
    );

    response
}

fn outcome_response(outcome: PipelineOutcome, request_id: &str) -> Response {
    match outcome {
        PipelineOutcome::Invalid { message } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "InvalidRequestError",
                message,
                request_id.to_string(),
            )),
        )
            .into_response(),

        PipelineOutcome::Dropped { filtering_summary } => (
            StatusCode::OK,
            Json(DroppedResponse::new(
                request_id.to_string(),
                filtering_summary,
            )),
        )
            .into_response(),

        PipelineOutcome::Unroutable { context } => (
            StatusCode::NOT_FOUND,
            Json(
                ErrorResponse::new(
                    "RoutingError",
                    "No matching routing rule found",
                    request_id.to_string(),
                )
                .with_routing_context(context),
            ),
        )
            .into_response(),

        PipelineOutcome::ForwardFailed {
            kind,
            message,
            context,
        } => {
            let status = match kind {
                ForwardErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ForwardErrorKind::Connection | ForwardErrorKind::BadResponse => {
                    StatusCode::BAD_GATEWAY
                }
            };
            (
                status,
                Json(
                    ErrorResponse::new("ForwardingError", message, request_id.to_string())
                        .with_forwarding_context(context),
                ),
            )
                .into_response()
        }

        PipelineOutcome::Routed {
            routing_summary,
            destination_response,
        } => (
            StatusCode::OK,
            Json(RoutedResponse::new(
                request_id.to_string(),
                routing_summary,
                destination_response,
            )),
        )
            .into_response(),
    }
}

/// `GET /health`
pub async fn health_check(Extension(ctx): Extension<RequestContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        request_id: ctx.request_id.to_string(),
    })
}

/// `GET /config` — the loaded configuration rendered as JSON. Destination
/// URLs are forbidden from carrying secrets at load time, so no redaction.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    Json(ConfigResponse {
        config: &state.config,
        request_id: ctx.request_id.to_string(),
    })
    .into_response()
}

/// JSON 404 for unknown paths.
pub async fn not_found(Extension(ctx): Extension<RequestContext>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            "NotFound",
            "The requested URL was not found on the server",
            ctx.request_id.to_string(),
        )),
    )
        .into_response()
}
