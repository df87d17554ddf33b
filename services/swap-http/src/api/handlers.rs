use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    Extension, Json,
};
use json_swap_core::safe_parse_slice_with_depth;
use tracing::{info, instrument, warn};

use super::error::ApiError;
use super::types::{HealthResponse, ReadinessResponse, ReplaceQuery, ReplaceResponse};
use super::RequestId;
use crate::metrics::MetricsSnapshot;
use crate::AppState;

const SERVICE_NAME: &str = "json-swap-http";

#[instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn replace(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<ReplaceQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ReplaceResponse>, ApiError> {
    state.metrics.record_request();

    match replace_document(&state, query, &headers, body) {
        Ok(outcome) => {
            state
                .metrics
                .record_success(outcome.replacements, outcome.limit_reached);
            info!(
                replacements = outcome.replacements,
                limit_reached = outcome.limit_reached,
                "document transformed"
            );
            Ok(Json(outcome))
        }
        Err(err) => {
            if err.is_server_error() {
                state.metrics.record_server_error();
            } else {
                state.metrics.record_client_error();
                warn!(code = err.code(), error = %err, "replace request rejected");
            }
            Err(err)
        }
    }
}

fn replace_document(
    state: &AppState,
    query: Result<Query<ReplaceQuery>, QueryRejection>,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<ReplaceResponse, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::InvalidMaxReplacements(err.body_text()))?;
    let requested = parse_max_replacements(query.max_replacements.as_deref())?;

    if !is_json_content_type(headers) {
        return Err(ApiError::UnsupportedMediaType);
    }

    let body = body.map_err(|err| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                limit: state.config.max_body_size_bytes,
            }
        } else {
            ApiError::InvalidBody(err.body_text())
        }
    })?;

    let document = safe_parse_slice_with_depth(&body, state.config.max_depth)?;
    let budget = state.effective_budget(requested);
    let outcome = state
        .replacer
        .transform(&document, budget, state.config.max_depth)?;

    Ok(outcome)
}

/// Accepts an absent override or a positive integer.
pub fn parse_max_replacements(raw: Option<&str>) -> Result<Option<u64>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ApiError::InvalidMaxReplacements(raw.to_string())),
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.metrics.uptime_secs(),
    })
}

pub async fn readiness(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    if state.is_shutting_down() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "shutting_down".to_string(),
            }),
        )
    } else {
        (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".to_string(),
            }),
        )
    }
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
