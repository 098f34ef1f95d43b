use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Movies API",
        "version": version,
        "endpoints": {
            "health": "/health (public)",
            "movies": "/movies[/:id] (public)",
            "credits": "/movies/:id/credits[/:credit_id] (public)",
            "signin": "/users/signin (public)",
            "signup": "/users/signup (admin)",
            "users": "/users (admin), /users/:id (public)",
        }
    }))
}

/// GET /health - Store connectivity probe
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": e.to_string(),
                })),
            )
        }
    }
}
