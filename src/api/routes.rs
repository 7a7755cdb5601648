use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let recommendations = Router::new()
        .route(
            "/",
            get(handlers::list_recommendations).post(handlers::create_recommendation),
        )
        .route("/random", get(handlers::random_recommendation))
        .route("/top/:amount", get(handlers::top_recommendations))
        .route("/:id", get(handlers::get_recommendation))
        .route("/:id/upvote", post(handlers::upvote))
        .route("/:id/downvote", post(handlers::downvote));

    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/recommendations", recommendations);

    if state.reset_enabled {
        tracing::warn!("Reset route enabled");
        router = router.route("/reset-database", delete(handlers::reset));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                // Must run before TraceLayer so the span can read the ID
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}
