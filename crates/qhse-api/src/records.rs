//! Uniform CRUD handlers, parameterized by a registry entry.
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `GET`    | `/{resource}`     | Full list, storage order |
//! | `POST`   | `/{resource}`     | Body id ignored; 201 with assigned id |
//! | `PUT`    | `/{resource}/:id` | Full overwrite; id forced to path param |
//! | `DELETE` | `/{resource}/:id` | Idempotent; returns an acknowledgement |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use qhse_core::{record::Record, schema::EntitySchema, store::RecordStore};
use serde_json::json;

use crate::error::ApiError;

/// `GET /{resource}`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  schema: &'static EntitySchema,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
{
  let records = store
    .list(schema)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

/// `POST /{resource}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  schema: &'static EntitySchema,
  Json(draft): Json<Record>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  schema
    .validate(&draft)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let record = store
    .create(schema, draft)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /{resource}/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  schema: &'static EntitySchema,
  Path(id): Path<String>,
  Json(draft): Json<Record>,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
{
  schema
    .validate(&draft)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let record = store
    .update(schema, id, draft)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(record))
}

/// `DELETE /{resource}/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  schema: &'static EntitySchema,
  Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RecordStore,
{
  store
    .delete(schema, id.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({
    "message": format!("{} {id} supprimé", schema.resource)
  })))
}
