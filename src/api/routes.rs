use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Stateless scoring
        .route("/match", post(handlers::match_profiles))
        // Reading lists
        .route("/users/:user_id/books", get(handlers::get_books))
        .route(
            "/users/:user_id/books/:item_id",
            put(handlers::save_book).delete(handlers::delete_book),
        )
        // Matching and chat
        .route("/users/:user_id/matches", get(handlers::get_matches))
        .route("/connect", post(handlers::connect))
        .route(
            "/sessions/:user_id/:other_user_id",
            get(handlers::get_session),
        )
}
