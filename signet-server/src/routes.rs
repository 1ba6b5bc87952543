//! Router assembly.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::gate;
use crate::handlers::{status, users};
use crate::state::AppState;

/// Assemble the application router.
///
/// Probe routes stay outside the health gate; every storage-backed route
/// sits behind it.
pub fn create_app(state: AppState) -> Router {
    let gated = Router::new()
        .route("/user", post(users::create_user))
        .route(
            "/user/{key}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/check-username", post(users::check_username))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_store,
        ));

    let cors_layer = build_cors_layer(&state);

    Router::new()
        .route("/ping", get(status::ping))
        .route("/health", get(status::health))
        .merge(gated)
        // Middleware layers, outer to inner: CORS first, then tracing.
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS unless an origin allow-list is configured.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config()
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    }
}
