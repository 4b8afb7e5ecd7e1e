//! Per-request correlation context.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Minted once at the HTTP edge and carried through request extensions.
/// Every response body, every log line, and the outbound `X-Request-ID`
/// header for one request share the same `request_id`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            received_at: Utc::now(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_are_unique() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.request_id, b.request_id);
    }
}
