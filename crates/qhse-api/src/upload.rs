//! The attachment store and `POST /upload` handler.

use std::path::{Path, PathBuf};

use axum::{
  Json,
  extract::Multipart,
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use qhse_core::id::new_id;
use serde::Serialize;

use crate::error::ApiError;

// ─── Attachment store ────────────────────────────────────────────────────────

/// Persists uploaded byte blobs under a content root.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
  root: PathBuf,
}

/// The retrieval handle returned for a saved attachment.
#[derive(Debug, Serialize)]
pub struct StoredAttachment {
  pub id:       String,
  pub file_url: String,
}

impl AttachmentStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Write `bytes` under the content root as `{id}_{filename}` and return
  /// the relative URL it becomes retrievable under. The identifier prefix
  /// makes every stored name fresh, so an existing file is never
  /// overwritten. No cleanup is attempted for writes interrupted mid-way.
  pub async fn save(
    &self,
    filename: &str,
    bytes: Bytes,
  ) -> std::io::Result<StoredAttachment> {
    let id = new_id();
    // The client-supplied name is reduced to its final path component.
    let base = Path::new(filename)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or("fichier");
    let stored_name = format!("{id}_{base}");
    tokio::fs::write(self.root.join(&stored_name), &bytes).await?;
    Ok(StoredAttachment {
      id,
      file_url: format!("/uploads/{stored_name}"),
    })
  }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /upload` — multipart body with a `file` field.
pub async fn handler(
  store: AttachmentStore,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?
  {
    if field.name() != Some("file") {
      continue;
    }
    let filename = field
      .file_name()
      .map(str::to_owned)
      .ok_or_else(|| ApiError::BadRequest("`file` field carries no filename".to_owned()))?;
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let stored = store.save(&filename, bytes).await?;
    return Ok((StatusCode::CREATED, Json(stored)));
  }

  Err(ApiError::BadRequest("multipart field `file` is required".to_owned()))
}
