//! Health Endpoints

use axum::{Json, Router, extract::State, routing::get};
use dewordle::{DewordleResult, PgDewordleRepository};
use serde_json::{Value, json};

pub fn health_router(repo: PgDewordleRepository) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/db", get(database))
        .with_state(repo)
}

/// GET /health
pub async fn liveness() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dewordle-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health/db
///
/// 503 with problem details when the pool cannot reach PostgreSQL.
pub async fn database(State(repo): State<PgDewordleRepository>) -> DewordleResult<Json<Value>> {
    repo.ping().await?;
    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
    })))
}
