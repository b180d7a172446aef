use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Non-blank `x-request-id` value, if present.
pub fn header_request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Span for `TraceLayer` carrying the request id, so access logs line up
/// with the `request_id` in response bodies.
pub fn http_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = header_request_id(request.headers()).unwrap_or("-"),
    )
}

/// Assigns time-sortable UUIDv7 request ids. Ids supplied by the caller in
/// `x-request-id` are kept by `SetRequestIdLayer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&uuid::Uuid::now_v7().to_string()).ok()?;
        Some(RequestId::new(id))
    }
}
