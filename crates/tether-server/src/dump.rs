// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response dumping around the dispatch route.
//!
//! The wrapper buffers both sides of the exchange, renders them at debug
//! level, and replays the captured response unchanged.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{Level, debug, error, warn};

use tether_config::LogConfig;

/// Largest request body buffered for dumping; matches axum's default body limit.
pub const MAX_REQUEST_BYTES: usize = 2 * 1024 * 1024;

/// Settings for [`dump_exchange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpConfig {
    /// Render exchanges at all.
    pub enabled: bool,
    /// Longest body rendered into the log.
    pub max_body_bytes: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl From<&LogConfig> for DumpConfig {
    fn from(log: &LogConfig) -> Self {
        Self {
            enabled: log.dump_requests,
            max_body_bytes: log.max_dump_bytes,
        }
    }
}

impl DumpConfig {
    fn active(&self) -> bool {
        self.enabled && tracing::enabled!(Level::DEBUG)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn render(
    head: String,
    headers: &HeaderMap,
    body: &[u8],
    max: usize,
) -> Result<String, std::str::Utf8Error> {
    let text = std::str::from_utf8(body)?;
    let mut out = head;
    out.push('\n');
    for (name, value) in headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(value.to_str().unwrap_or("<binary>"));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(truncate(text, max));
    if text.len() > max {
        out.push_str("...");
    }
    Ok(out)
}

/// Middleware that logs each request and response when dumping is active.
///
/// Install with `axum::middleware::from_fn_with_state(config, dump_exchange)`.
pub async fn dump_exchange(
    State(config): State<DumpConfig>,
    request: Request,
    next: Next,
) -> Response {
    if !config.active() {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_REQUEST_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, limit = MAX_REQUEST_BYTES, "failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };
    let head = format!("{} {} {:?}", parts.method, parts.uri, parts.version);
    match render(head, &parts.headers, &body, config.max_body_bytes) {
        Ok(dump) => debug!(request = %dump, "rpc request"),
        Err(e) => error!(error = %e, "cannot render request"),
    }

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let (parts, body) = response.into_parts();
    let body: Bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let head = format!("{:?} {}", parts.version, parts.status);
    match render(head, &parts.headers, &body, config.max_body_bytes) {
        Ok(dump) => debug!(response = %dump, "rpc response"),
        Err(e) => error!(error = %e, "cannot render response"),
    }

    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::header;
    use axum::middleware::from_fn_with_state;
    use axum::routing::post;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    async fn echo(body: Bytes) -> Response {
        ([(header::CONTENT_TYPE, "application/octet-stream")], body).into_response()
    }

    fn router(config: DumpConfig) -> Router {
        Router::new()
            .route("/", post(echo))
            .layer(from_fn_with_state(config, dump_exchange))
    }

    async fn send(router: Router, body: Vec<u8>) -> (StatusCode, HeaderMap, Bytes) {
        let response = router
            .oneshot(
                axum::http::Request::post("/")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        (parts.status, parts.headers, bytes)
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn renders_head_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let out = render("POST / HTTP/1.1".into(), &headers, b"{\"a\":1}", 100).unwrap();
        assert_eq!(out, "POST / HTTP/1.1\ncontent-type: application/json\n\n{\"a\":1}");
    }

    #[tokio::test]
    #[traced_test]
    async fn dumps_exchange_at_debug() {
        let (status, _, body) = send(router(DumpConfig::default()), b"ping".to_vec()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ping");
        assert!(logs_contain("rpc request"));
        assert!(logs_contain("rpc response"));
    }

    #[tokio::test]
    #[traced_test]
    async fn render_failure_leaves_response_intact() {
        let payload = vec![0xff, 0xfe, 0x00, 0x01];
        let (status, headers, body) = send(router(DumpConfig::default()), payload.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(body.to_vec(), payload);
        assert!(logs_contain("cannot render request"));
        assert!(logs_contain("cannot render response"));
    }

    #[tokio::test]
    #[traced_test]
    async fn disabled_wrapper_logs_nothing() {
        let config = DumpConfig {
            enabled: false,
            max_body_bytes: 16,
        };
        let (_, _, body) = send(router(config), b"quiet".to_vec()).await;
        assert_eq!(&body[..], b"quiet");
        assert!(!logs_contain("rpc request"));
    }

    #[tokio::test]
    #[traced_test]
    async fn oversized_request_is_refused_before_buffering_all_of_it() {
        let payload = vec![b'x'; MAX_REQUEST_BYTES + 1];
        let (status, _, _) = send(router(DumpConfig::default()), payload).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(logs_contain("failed to buffer request body"));
        assert!(!logs_contain("rpc request"));
    }

    #[tokio::test]
    #[traced_test]
    async fn wrapped_and_bare_responses_match() {
        let bare = Router::new().route("/", post(echo));
        let wrapped = router(DumpConfig::default());
        let payload = br#"{"jsonrpc":"2.0","method":"A.Echo","id":1}"#.to_vec();

        let (bare_status, bare_headers, bare_body) = send(bare, payload.clone()).await;
        let (status, headers, body) = send(wrapped, payload).await;
        assert_eq!(status, bare_status);
        assert_eq!(headers, bare_headers);
        assert_eq!(body, bare_body);
    }
}
