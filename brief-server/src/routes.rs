//! Route definitions for the QuickBrief server.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post}
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer
};

use crate::handlers;
use crate::state::AppState;

/// Creates the Axum router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/brief", post(handlers::brief))
        .route("/generate", post(handlers::generate))
        .route("/mail/draft", post(handlers::draft_mail))
        .route("/mail/send", post(handlers::send_mail));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest("/v1", api_v1)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
