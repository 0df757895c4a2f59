// HTTP request handlers
use crate::application::query_service::QueryDataRequest;
use crate::application::streaming_service::StreamError;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// `OK`, or the configuration/upstream error as a 503.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    match state.query_service.check_health().await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

/// Runs a batch of queries; per-query failures are reported in the body.
pub async fn query_data(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryDataRequest>,
) -> Response {
    let compress = accepts_brotli(&headers);
    tracing::debug!("Received {} queries", request.queries.len());

    let response = state.query_service.query_data(request).await;
    match json_response(StatusCode::OK, &response, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Subscribes to a channel registered by a streaming query.
pub async fn stream_channel(
    Path((instance, uid)): Path<(String, String)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    match state.streaming_service.subscribe(&instance, &uid) {
        Ok(rx) => stream_from_receiver(rx, compress),
        Err(e @ StreamError::UnknownChannel { .. }) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Stream subscription failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
