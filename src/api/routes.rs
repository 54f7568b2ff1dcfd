use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::config::Config;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let board_routes = Router::new()
        .route("/", get(handlers::board::get_board))
        .route("/refresh", post(handlers::board::refresh_board))
        .route("/drag/start", post(handlers::board::begin_drag))
        .route("/drag/over", post(handlers::board::drag_over))
        .route("/drag/end", post(handlers::board::end_drag))
        .route("/drag/cancel", post(handlers::board::cancel_drag));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/api/notifications", get(handlers::board::list_notifications))
        .route("/api/events", get(handlers::sse::sse_handler))
        .nest("/api/board", board_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
