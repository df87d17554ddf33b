use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::AppState;

mod error;
mod handlers;
mod types;

pub use error::ApiError;
pub use handlers::{
    health_check, metrics, not_found, parse_max_replacements, readiness, replace,
};
pub use types::{ErrorResponse, HealthResponse, ReadinessResponse, ReplaceQuery, ReplaceResponse};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id attached to every request and echoed on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

pub fn create_router(state: Arc<AppState>) -> Router {
    let replace_routes = Router::new()
        .route("/api/replace", post(replace))
        .layer(DefaultBodyLimit::max(state.config.max_body_size_bytes))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit,
        ));

    Router::new()
        .merge(replace_routes)
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .with_state(Arc::clone(&state))
        .layer(CatchPanicLayer::custom(panic_response(Arc::clone(&state))))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(set_request_id))
}

async fn set_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| is_acceptable_request_id(value))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), header_value);
    }

    let mut response = next.run(request).await;

    if !response.headers().contains_key(&REQUEST_ID_HEADER) {
        if let Ok(header_value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), header_value);
        }
    }

    response
}

fn is_acceptable_request_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

async fn rate_limit(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let client = client_key(&request);

    match state.limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(limited) => {
            state.metrics.record_request();
            state.metrics.record_rate_limited();
            let retry_after_secs = limited.retry_after_secs();
            warn!(client = %client, retry_after_secs, "rate limit exceeded");
            ApiError::RateLimited { retry_after_secs }.into_response()
        }
    }
}

/// Turns a handler panic into a 500 `INTERNAL_ERROR` response.
fn panic_response(
    state: Arc<AppState>,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |panic| {
        let detail = if let Some(message) = panic.downcast_ref::<String>() {
            message.clone()
        } else if let Some(message) = panic.downcast_ref::<&str>() {
            message.to_string()
        } else {
            "unknown panic payload".to_string()
        };

        error!(panic = %detail, "handler panicked");
        state.metrics.record_server_error();
        ApiError::Internal(detail).into_response()
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
