//! Request identification.
//!
//! # Responsibilities
//! - Assign a UUID v4 `x-request-id` when the client did not send one
//! - Echo the id on the response
//! - Attach the id to the request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible, before the trace span opens

use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that sets `x-request-id` on incoming requests.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies `x-request-id` from the request to the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Read the request id, if present and printable.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Span for `TraceLayer` carrying method, path and request id.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = request_id(request).unwrap_or("unknown"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_lookup() {
        let request = Request::builder()
            .header("x-request-id", "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request_id(&request), Some("abc-123"));

        let request = Request::builder().body(()).unwrap();
        assert_eq!(request_id(&request), None);
    }
}
