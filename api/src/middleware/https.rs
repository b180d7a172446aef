use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const HSTS: &str = "max-age=63072000; includeSubDomains";

/// Enforce HTTPS behind a TLS-terminating proxy.
///
/// Requests the proxy marks as `X-Forwarded-Proto: http` are redirected
/// (308, so POST bodies are replayed) to the HTTPS equivalent. Every
/// response carries an HSTS header.
pub async fn require_https(req: Request, next: Next) -> Response {
    if let Some(location) = redirect_target(req.headers(), req.uri().path_and_query().map(|pq| pq.as_str())) {
        let mut response =
            (StatusCode::PERMANENT_REDIRECT, [("location", location)]).into_response();
        add_hsts_header(&mut response);
        return response;
    }

    let mut response = next.run(req).await;
    add_hsts_header(&mut response);
    response
}

/// HTTPS location for a plain-HTTP request, `None` when no redirect is due.
fn redirect_target(headers: &HeaderMap, path_and_query: Option<&str>) -> Option<String> {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())?;
    if !proto.eq_ignore_ascii_case("http") {
        return None;
    }

    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    Some(format!("https://{host}{}", path_and_query.unwrap_or("/")))
}

fn add_hsts_header(response: &mut Response) {
    response
        .headers_mut()
        .insert("strict-transport-security", HeaderValue::from_static(HSTS));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn plain_http_is_redirected_with_path_and_query() {
        let target = redirect_target(
            &headers(&[("x-forwarded-proto", "http"), ("host", "api.example")]),
            Some("/v1/agent?x=1"),
        );
        assert_eq!(target.as_deref(), Some("https://api.example/v1/agent?x=1"));
    }

    #[test]
    fn https_or_unknown_proto_is_left_alone() {
        assert_eq!(redirect_target(&headers(&[("x-forwarded-proto", "https")]), None), None);
        assert_eq!(redirect_target(&headers(&[]), None), None);
    }

    #[tokio::test]
    async fn middleware_redirects_and_sets_hsts() {
        async fn ok() -> StatusCode {
            StatusCode::OK
        }
        let app = Router::new()
            .route("/v1/agent", post(ok))
            .layer(middleware::from_fn(require_https));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/agent")
                    .header("x-forwarded-proto", "http")
                    .header("host", "api.example")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get("location").expect("location header"),
            "https://api.example/v1/agent"
        );
        assert!(response.headers().get("strict-transport-security").is_some());
    }
}
