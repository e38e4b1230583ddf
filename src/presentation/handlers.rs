// HTTP request handlers
use crate::application::command_service::{CloudCommand, CommandError};
use crate::domain::reading::TelemetryValue;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::wire_mapper::{
    WireLogEntry, WireSource, log_entry_to_wire, outcome_to_wire, source_to_wire,
};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct InsightQuery {
    /// Last known value as JSON, fed in as the first sample
    pub value: Option<String>,
}

/// Parse the out-of-band current value; anything that is not JSON is taken as text
fn parse_current_value(raw: &str) -> TelemetryValue {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => TelemetryValue::from_json(json),
        Err(_) => TelemetryValue::from(raw),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List sample sources and their sensor settings
pub async fn list_sources(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let sources: Vec<WireSource> = state
        .registry
        .sources()
        .iter()
        .map(|s| source_to_wire(&**s))
        .collect();

    match json_response(&sources, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream chart snapshots for one telemetry id until the client goes away
pub async fn stream_insight(
    Path(id): Path<String>,
    Query(query): Query<InsightQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let current_value = query.value.as_deref().map(parse_current_value);
    let rx = state.streaming_service.stream_insight(&id, current_value);
    stream_from_receiver(rx, accepts_brotli(&headers)).await
}

/// Relay a cloud command into local sensor configuration
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<CloudCommand>,
) -> impl IntoResponse {
    match state.command_service.handle(command) {
        Ok(outcome) => (StatusCode::OK, Json(outcome_to_wire(outcome))).into_response(),
        Err(e) => {
            let status = match e {
                CommandError::InvalidPayload { .. } | CommandError::Source(_) => StatusCode::BAD_REQUEST,
                CommandError::UnknownSensor(_) => StatusCode::NOT_FOUND,
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Received commands, oldest first
pub async fn list_logs(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let logs: Vec<WireLogEntry> = state
        .command_service
        .logs()
        .into_iter()
        .map(log_entry_to_wire)
        .collect();

    match json_response(&logs, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub async fn clear_logs(State(state): State<Arc<AppState>>) -> StatusCode {
    state.command_service.clear_logs();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::Reading;

    #[test]
    fn test_parse_current_value() {
        assert_eq!(parse_current_value("21.5"), TelemetryValue::from(21.5));
        assert_eq!(
            parse_current_value(r#"{"lat": 45.1, "lon": 9.2}"#),
            TelemetryValue::composite([("lat", 45.1), ("lon", 9.2)])
        );
        assert_eq!(
            parse_current_value("walking"),
            TelemetryValue::Scalar(Reading::Text("walking".to_string()))
        );
    }
}
