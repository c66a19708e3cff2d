//! Liveness, diagnostics and demo seeding.

use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;

use crate::db::{seed_demo_courses, table_names, SeedOutcome};
use crate::AppState;

use super::error::ApiError;
use super::extract::Json;

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: String,
}

/// Backend and database diagnostic report
#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub backend: &'static str,
    pub version: &'static str,
    pub database: String,
    pub connection_status: &'static str,
    pub collections: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// GET /
pub async fn root() -> Json<Message> {
    Json(Message {
        message: "Student Management System API",
    })
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /test
///
/// Never fails: a broken database is reported in the body.
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    let (database, connection_status, collections) = match table_names(&state.db).await {
        Ok(tables) => ("Connected & Working".to_string(), "Connected", tables),
        Err(e) => {
            tracing::warn!("Database diagnostic failed: {}", e);
            (format!("Connected but Error: {}", e), "Error", Vec::new())
        }
    };

    Json(DiagnosticsResponse {
        backend: "Running",
        version: env!("CARGO_PKG_VERSION"),
        database,
        connection_status,
        collections,
    })
}

/// POST /seed
pub async fn seed(State(state): State<Arc<AppState>>) -> Result<Json<SeedResponse>, ApiError> {
    let response = match seed_demo_courses(&state.db).await? {
        SeedOutcome::Seeded(count) => SeedResponse {
            message: "Seeded",
            count: Some(count),
        },
        SeedOutcome::AlreadySeeded => SeedResponse {
            message: "Already seeded",
            count: None,
        },
    };
    Ok(Json(response))
}
