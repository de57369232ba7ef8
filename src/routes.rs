// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{participant, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges the participant and quiz sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, config, live sessions).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let participant_routes = Router::new()
        .route("/", post(participant::register))
        // Protected participant routes
        .merge(
            Router::new()
                .route("/me", get(participant::get_me))
                .route_layer(auth.clone()),
        );

    let quiz_routes = Router::new()
        .route("/sessions", post(quiz::start_session))
        .route("/sessions/{id}", get(quiz::get_session))
        .route("/sessions/{id}/answers", put(quiz::record_answer))
        .route("/sessions/{id}/submit", post(quiz::submit_session))
        .route_layer(auth);

    Router::new()
        .nest("/api/participants", participant_routes)
        .nest("/api/quiz", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
