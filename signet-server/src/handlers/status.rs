//! Liveness and store-health probes. Both stay outside the health gate.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

/// Plain liveness probe; answers regardless of store health.
pub async fn ping() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Signet account service is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Store-health probe.
///
/// Unlike the gate, this probes the store live and records the outcome,
/// so a recovered store flips the server back to serving without a
/// restart. Answers 200 while connected, 503 with the recorded error
/// while degraded.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.directory().ping().await {
        Ok(()) => state.health().mark_connected(),
        Err(err) => state.health().mark_disconnected(err.to_string()),
    }

    let snapshot = state.health().snapshot();
    let database_status = if snapshot.connected {
        "healthy"
    } else {
        "unhealthy"
    };
    let mut body = json!({
        "status": database_status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "database": {
                "status": database_status,
            }
        }
    });
    if let Some(err) = snapshot.last_error {
        body["checks"]["database"]["error"] = json!(err);
    }

    if snapshot.connected {
        (StatusCode::OK, Json(body))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}
