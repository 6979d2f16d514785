//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        .route("/weights", get(handlers::get_weights))
        .route(
            "/entities",
            post(handlers::create_entity).get(handlers::list_entities),
        )
        .route(
            "/entities/:name",
            get(handlers::get_entity)
                .patch(handlers::update_entity)
                .delete(handlers::delete_entity),
        )
        .route("/entities/by-tier/:tier", get(handlers::list_entities_by_tier));

    let router = Router::new()
        .route("/", get(handlers::echo))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
