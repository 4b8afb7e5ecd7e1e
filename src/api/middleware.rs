//! Request preprocessing: per-request context and response correlation.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::context::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Mint a fresh [`RequestContext`] for every inbound request and echo its ID
/// as an `X-Request-ID` response header. An inbound `X-Request-ID` is not
/// honored; the minted UUID is the single correlation key.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id.to_string()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value);
    }

    response
}
