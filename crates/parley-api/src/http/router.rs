//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: CORS, request tracing.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Users
        .route("/users", post(handlers::user::create_user))
        .route("/users", get(handlers::user::list_users))
        .route("/users/{id}", get(handlers::user::get_user))
        .route("/users/{id}", put(handlers::user::update_user))
        .route("/users/{id}", delete(handlers::user::delete_user))
        // Bots
        .route("/bots", post(handlers::bot::create_bot))
        .route("/bots", get(handlers::bot::list_bots))
        .route("/bots/{id}", get(handlers::bot::get_bot))
        .route("/bots/{id}", put(handlers::bot::update_bot))
        .route("/bots/{id}", delete(handlers::bot::delete_bot))
        // Conversations
        .route(
            "/conversations",
            post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation),
        )
        .route(
            "/conversations/{id}",
            put(handlers::conversation::update_conversation),
        )
        .route(
            "/conversations/{id}",
            delete(handlers::conversation::delete_conversation),
        )
        // Participants
        .route(
            "/conversations/{id}/participants",
            post(handlers::conversation::add_participant),
        )
        .route(
            "/conversations/{id}/participants",
            get(handlers::conversation::list_participants),
        )
        .route(
            "/conversations/{id}/participants/{kind}/{actor_id}",
            delete(handlers::conversation::remove_participant),
        )
        // Messages
        .route(
            "/conversations/{id}/messages",
            post(handlers::message::post_message),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::message::list_messages),
        )
        .route("/messages/{id}", put(handlers::message::update_message))
        .route("/messages/{id}", delete(handlers::message::delete_message));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no identity required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
