/// Health check endpoint
///
/// Public, no authentication. Always 200; an unreachable dependency shows up
/// as `degraded` in the body.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// Session store: `connected` or `disconnected`
    pub sessions: String,
}

fn connection_status(ok: bool) -> &'static str {
    if ok {
        "connected"
    } else {
        "disconnected"
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = state.storage.health_check().await;
    let sessions_ok = state.sessions().is_healthy().await;

    if !database_ok || !sessions_ok {
        tracing::warn!(database_ok, sessions_ok, "Health check degraded");
    }

    Json(HealthResponse {
        status: if database_ok && sessions_ok {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: connection_status(database_ok).to_string(),
        sessions: connection_status(sessions_ok).to_string(),
    })
}
