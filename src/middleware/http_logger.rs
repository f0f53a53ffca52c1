use axum::{extract::Request, middleware::Next, response::Response};
use std::collections::BTreeMap;
use std::time::Instant;

/// Check if HTTP logging is enabled
fn is_logging_enabled() -> bool {
    std::env::var("REELGEN_HTTP_LOGGING")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(true)
}

/// Logs every request as a tracing event and records it as a Sentry breadcrumb.
/// Bodies are never captured, uploads are raw image bytes.
pub async fn http_logging_middleware(req: Request, next: Next) -> Response {
    if !is_logging_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let content_length = req
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let res = next.run(req).await;

    let status = res.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status >= 500 {
        tracing::warn!(%method, %path, status, duration_ms, "request failed");
    } else {
        tracing::info!(%method, %path, status, duration_ms, ?content_length, "request completed");
    }

    add_breadcrumb(method.as_str(), &path, status, duration_ms);

    res
}

fn breadcrumb_level(status: u16) -> sentry::Level {
    if status >= 500 {
        sentry::Level::Error
    } else if status >= 400 {
        sentry::Level::Warning
    } else {
        sentry::Level::Info
    }
}

fn add_breadcrumb(method: &str, path: &str, status: u16, duration_ms: u64) {
    let mut data = BTreeMap::new();
    data.insert("method".to_string(), serde_json::json!(method));
    data.insert("url".to_string(), serde_json::json!(path));
    data.insert("status_code".to_string(), serde_json::json!(status));
    data.insert("duration_ms".to_string(), serde_json::json!(duration_ms));

    sentry::add_breadcrumb(sentry::Breadcrumb {
        ty: "http".to_string(),
        category: Some("http.request".to_string()),
        message: Some(format!("{method} {path} {status} ({duration_ms}ms)")),
        data: data.into_iter().collect(),
        level: breadcrumb_level(status),
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_breadcrumb_level() {
        assert_eq!(breadcrumb_level(200), sentry::Level::Info);
        assert_eq!(breadcrumb_level(400), sentry::Level::Warning);
        assert_eq!(breadcrumb_level(502), sentry::Level::Error);
    }

    #[tokio::test]
    async fn test_middleware_passes_response_through() {
        let app = Router::new()
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .layer(axum::middleware::from_fn(http_logging_middleware));

        let res = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/teapot")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    }
}
