// Handlers: version, directory listing/registration, stats queries

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::AppState;
use crate::models::NewServer;
use crate::stats_repo::aggregation::Interval;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/servers — the full directory.
pub(super) async fn list_servers_handler(State(state): State<AppState>) -> Response {
    match state.server_repo.list_all().await {
        Ok(servers) => axum::Json(servers).into_response(),
        Err(e) => storage_error(e, "list_servers"),
    }
}

/// POST /api/servers — register a server so the poller picks it up.
pub(super) async fn register_server_handler(
    State(state): State<AppState>,
    axum::Json(new): axum::Json<NewServer>,
) -> Response {
    if new.name.trim().is_empty() || new.address.trim().is_empty() {
        return bad_request("name and address must be non-empty");
    }
    if new.port == 0 {
        return bad_request("port must be between 1 and 65535");
    }
    let created_at = chrono::Utc::now().timestamp_millis();
    match state.server_repo.create(&new, created_at).await {
        Ok(server) => (StatusCode::CREATED, axum::Json(server)).into_response(),
        Err(e) => storage_error(e, "register_server"),
    }
}

/// Query shape shared by both stats endpoints. `time` wins over
/// `interval`; with neither the raw series is returned.
#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    time: Option<i64>,
    from: Option<i64>,
    to: Option<i64>,
    interval: Option<String>,
}

/// GET /api/stats/{server_id} — one server's series.
pub(super) async fn server_stats_handler(
    State(state): State<AppState>,
    Path(server_id): Path<i64>,
    Query(query): Query<StatsQuery>,
) -> Response {
    stats_response(&state, Some(server_id), query).await
}

/// GET /api/stats — the combined series of the whole directory.
pub(super) async fn global_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Response {
    stats_response(&state, None, query).await
}

async fn stats_response(state: &AppState, server_id: Option<i64>, query: StatsQuery) -> Response {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return bad_request("from must not exceed to");
    }

    if let Some(ts) = query.time {
        return match state.stats_repo.point_in_time(server_id, ts).await {
            Ok(point) => axum::Json(point).into_response(),
            Err(e) => storage_error(e, "point_in_time"),
        };
    }

    if let Some(ref name) = query.interval {
        let interval = Interval::parse(name);
        return match state
            .stats_repo
            .bucketed_series(server_id, interval, query.from, query.to)
            .await
        {
            Ok(points) => axum::Json(points).into_response(),
            Err(e) => storage_error(e, "bucketed_series"),
        };
    }

    match state
        .stats_repo
        .raw_series(server_id, query.from, query.to)
        .await
    {
        Ok(points) => axum::Json(points).into_response(),
        Err(e) => storage_error(e, "raw_series"),
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn storage_error(e: anyhow::Error, operation: &'static str) -> Response {
    tracing::error!(error = %e, operation, "request failed on storage");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}
