//! Health gating for storage-backed routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::state::AppState;

/// Short-circuits requests while the store is down.
///
/// Reads the recorded health state rather than probing the store, so a
/// degraded server rejects cheaply instead of stacking up pool timeouts.
/// `/health` is the route that re-probes and can flip the state back.
pub async fn require_store(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.health().is_connected() {
        return next.run(request).await;
    }

    let message = match state.health().snapshot().last_error {
        Some(err) => format!("Storage unavailable: {err}"),
        None => "Storage unavailable".to_string(),
    };
    AppError::service_unavailable(message).into_response()
}
