use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{movies, system, users};
use crate::middleware::{check_token, require_admin};
use crate::state::AppState;

/// Builds the full HTTP router around `state`.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(movie_routes())
        .merge(user_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(movies::movie_list).post(movies::movie_create))
        .route(
            "/movies/:id",
            get(movies::movie_get)
                .patch(movies::movie_update)
                .delete(movies::movie_delete),
        )
        .route(
            "/movies/:id/credits",
            get(movies::credits_get).post(movies::credits_post),
        )
        .route(
            "/movies/:id/credits/:credit_id",
            patch(movies::credits_patch).delete(movies::credits_delete),
        )
}

fn user_routes(state: AppState) -> Router<AppState> {
    // Token check runs first, then the admin check against the stored account
    let admin_only = ServiceBuilder::new()
        .layer(from_fn_with_state(state.clone(), check_token))
        .layer(from_fn_with_state(state, require_admin));

    Router::new()
        .route("/users/signin", post(users::signin))
        .route("/users/signup", post(users::signup).route_layer(admin_only.clone()))
        .route("/users", get(users::user_list).route_layer(admin_only))
        .route("/users/:id", get(users::user_get))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
