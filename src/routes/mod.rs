// HTTP routes

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::server_repo::ServerRepo;
use crate::stats_repo::StatsRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) server_repo: Arc<ServerRepo>,
    pub(crate) stats_repo: Arc<StatsRepo>,
}

pub fn app(server_repo: Arc<ServerRepo>, stats_repo: Arc<StatsRepo>) -> Router {
    let state = AppState {
        server_repo,
        stats_repo,
    };
    Router::new()
        .route("/", get(|| async { "craftlist: server directory stats API" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route(
            "/api/servers",
            get(http::list_servers_handler).post(http::register_server_handler),
        ) // GET + POST /api/servers
        .route("/api/stats", get(http::global_stats_handler)) // GET /api/stats
        .route("/api/stats/{server_id}", get(http::server_stats_handler)) // GET /api/stats/{server_id}
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
