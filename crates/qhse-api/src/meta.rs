//! Liveness banner and health check.

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

/// `GET /`
pub async fn root() -> Json<Value> {
  Json(json!({
    "message": "API QHSE fonctionne!",
    "version": env!("CARGO_PKG_VERSION"),
  }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
  Json(json!({
    "status": "healthy",
    "timestamp": Utc::now().to_rfc3339(),
  }))
}
