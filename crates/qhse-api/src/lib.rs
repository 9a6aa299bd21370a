//! JSON REST API for the QHSE record store.
//!
//! Exposes an axum [`Router`] backed by any [`qhse_core::store::RecordStore`].
//! CORS, static file serving, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", qhse_api::api_router(store.clone(), attachments))
//! ```

pub mod error;
pub mod meta;
pub mod records;
pub mod upload;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Multipart, Path, State},
  routing::{get, post, put},
};
use qhse_core::{Record, REGISTRY, store::RecordStore};

pub use error::ApiError;
pub use upload::{AttachmentStore, StoredAttachment};

/// Build a fully-materialised API router for `store`.
///
/// One route group per registry entry plus the upload endpoint. The
/// returned `Router<()>` can be nested into any parent router regardless of
/// its own state type.
pub fn api_router<S>(store: Arc<S>, attachments: AttachmentStore) -> Router<()>
where
  S: RecordStore + 'static,
{
  let mut router: Router<Arc<S>> = Router::new();

  for schema in REGISTRY {
    let collection = format!("/{}", schema.resource);
    let item = format!("/{}/{{id}}", schema.resource);
    router = router
      .route(
        &collection,
        get(move |state: State<Arc<S>>| records::list(state, schema)).post(
          move |state: State<Arc<S>>, draft: Json<Record>| {
            records::create(state, schema, draft)
          },
        ),
      )
      .route(
        &item,
        put(
          move |state: State<Arc<S>>, id: Path<String>, draft: Json<Record>| {
            records::update(state, schema, id, draft)
          },
        )
        .delete(move |state: State<Arc<S>>, id: Path<String>| {
          records::delete(state, schema, id)
        }),
      );
  }

  router
    .route(
      "/upload",
      post(move |multipart: Multipart| upload::handler(attachments.clone(), multipart)),
    )
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
