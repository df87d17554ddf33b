use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use json_swap_http::{create_router, AppState, SwapConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> SwapConfig {
    SwapConfig {
        max_replacements: 5,
        max_depth: 3,
        max_body_size_bytes: 256,
        rate_limit_max_requests: 50,
        log_level: "warn".to_string(),
        ..SwapConfig::default()
    }
}

fn app_with(config: SwapConfig) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config).expect("valid config"));
    (create_router(Arc::clone(&state)), state)
}

fn replace_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut de = serde_json::Deserializer::from_slice(&bytes);
    de.disable_recursion_limit();
    let value = serde::Deserialize::deserialize(&mut de).unwrap();
    de.end().unwrap();
    value
}

#[tokio::test]
async fn test_replace_returns_transformed_document() {
    let (app, _) = app_with(test_config());
    let response = app
        .oneshot(replace_request(
            "/api/replace",
            r#"{"pet": "dog", "note": "hotdog", "count": 2}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({
            "result": {"pet": "cat", "note": "hotdog", "count": 2},
            "replacements": 1,
            "limitReached": false
        })
    );
}

#[tokio::test]
async fn test_replace_strips_dangerous_keys() {
    let (app, _) = app_with(test_config());
    let response = app
        .oneshot(replace_request(
            "/api/replace",
            r#"{"__proto__": {"x": "dog"}, "safe": "dog"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"], json!({"safe": "cat"}));
    assert_eq!(body["replacements"], 1);
}

#[tokio::test]
async fn test_override_is_capped_by_configured_maximum() {
    let (app, _) = app_with(test_config());
    let doc = r#"["dog", "dog", "dog", "dog", "dog", "dog", "dog"]"#;

    let response = app
        .clone()
        .oneshot(replace_request("/api/replace?maxReplacements=2", doc))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["replacements"], 2);
    assert_eq!(body["limitReached"], true);
    assert_eq!(
        body["result"],
        json!(["cat", "cat", "dog", "dog", "dog", "dog", "dog"])
    );

    let response = app
        .oneshot(replace_request("/api/replace?maxReplacements=1000", doc))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["replacements"], 5);
    assert_eq!(body["limitReached"], true);
}

#[tokio::test]
async fn test_invalid_override_is_rejected() {
    let (app, _) = app_with(test_config());
    for uri in [
        "/api/replace?maxReplacements=0",
        "/api/replace?maxReplacements=-3",
        "/api/replace?maxReplacements=abc",
    ] {
        let response = app
            .clone()
            .oneshot(replace_request(uri, r#""dog""#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        let body = json_body(response).await;
        assert_eq!(body["code"], "INVALID_MAX_REPLACEMENTS");
    }
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let (app, state) = app_with(test_config());
    let response = app
        .oneshot(replace_request("/api/replace", r#"{"a": 1,}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "MALFORMED_JSON");
    assert_eq!(state.metrics.snapshot().client_errors_total, 1);
}

#[tokio::test]
async fn test_depth_limit_is_enforced_at_boundary() {
    let (app, _) = app_with(test_config());

    let response = app
        .clone()
        .oneshot(replace_request("/api/replace", r#"[[["dog"]]]"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(replace_request("/api/replace", r#"[[[["dog"]]]]"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "DEPTH_LIMIT_EXCEEDED");
    assert_eq!(body["details"]["maxDepth"], 3);
}

fn nested(depth: usize) -> String {
    format!("{}\"dog\"{}", "[".repeat(depth), "]".repeat(depth))
}

#[tokio::test]
async fn test_depth_limit_holds_at_parser_ceiling() {
    let (app, _) = app_with(SwapConfig {
        max_depth: 128,
        max_body_size_bytes: 4096,
        ..test_config()
    });

    let response = app
        .clone()
        .oneshot(replace_request("/api/replace", &nested(128)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["replacements"], 1);

    let response = app
        .oneshot(replace_request("/api/replace", &nested(129)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "DEPTH_LIMIT_EXCEEDED");
    assert_eq!(body["details"]["maxDepth"], 128);
}

#[tokio::test]
async fn test_very_deep_document_reports_configured_depth() {
    let (app, state) = app_with(SwapConfig {
        max_depth: 32,
        max_body_size_bytes: 4096,
        ..test_config()
    });

    let response = app
        .oneshot(replace_request("/api/replace", &nested(200)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "DEPTH_LIMIT_EXCEEDED");
    assert_eq!(body["details"]["maxDepth"], 32);
    assert_eq!(state.metrics.snapshot().client_errors_total, 1);
}

#[tokio::test]
async fn test_non_json_content_type_is_rejected() {
    let (app, _) = app_with(test_config());
    let request = Request::builder()
        .method("POST")
        .uri("/api/replace")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#""dog""#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, _) = app_with(test_config());
    let big = format!("\"{}\"", "dog ".repeat(200));
    let response = app
        .oneshot(replace_request("/api/replace", &big))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_rate_limit_applies_to_replace_route() {
    let (app, state) = app_with(SwapConfig {
        rate_limit_max_requests: 2,
        ..test_config()
    });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(replace_request("/api/replace", r#""dog""#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(replace_request("/api/replace", r#""dog""#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Operational endpoints stay reachable.
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.metrics.snapshot().rate_limited_total, 1);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let (app, _) = app_with(test_config());
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));

    let request = Request::get("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-abc-123");
}

#[tokio::test]
async fn test_health_ready_and_metrics() {
    let (app, state) = app_with(test_config());

    let response = app
        .clone()
        .oneshot(replace_request("/api/replace", r#"["dog", "dog dog"]"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "json-swap-http");

    let response = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["requestsTotal"], 1);
    assert_eq!(body["replacementsTotal"], 3);

    let response = app
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    state.begin_shutdown();
    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "shutting_down");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = app_with(test_config());
    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}
