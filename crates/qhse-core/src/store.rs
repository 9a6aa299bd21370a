//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `qhse-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.
//! Every operation is parameterized by a `'static` registry entry; callers
//! obtain schemas from [`REGISTRY`](crate::schema::REGISTRY), so no string
//! lookup can fail at request time.

use std::future::Future;

use crate::{record::Record, schema::EntitySchema};

/// Abstraction over a QHSE record store backend.
///
/// Identifier assignment is the store's job: `create` overwrites any
/// client-supplied `id`, and `update` forces the returned record's `id` to
/// the addressed one. For a composite schema (one with a child collection),
/// each write operation must replace or remove the owned child rows
/// atomically with the parent write.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return every stored record. Ordering is whatever the backend yields
  /// for an unordered select; callers must not rely on it.
  fn list(
    &self,
    schema: &'static EntitySchema,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;

  /// Validate `draft`, assign a fresh identifier, persist one row (plus
  /// child rows, in supplied order, for a composite schema) and return the
  /// full stored record.
  fn create(
    &self,
    schema: &'static EntitySchema,
    draft: Record,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Overwrite every non-identifier field of the row matching `id`.
  ///
  /// For a composite schema the existing child rows are deleted and the
  /// supplied list reinserted — full replace, never merge. A nonexistent
  /// `id` affects zero rows yet still returns an apparently-successful
  /// record; this mirrors the system being replaced.
  fn update(
    &self,
    schema: &'static EntitySchema,
    id: String,
    draft: Record,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Hard-delete the row matching `id` (and its child rows, for a
  /// composite schema). Deleting a nonexistent id is not an error.
  fn delete(
    &self,
    schema: &'static EntitySchema,
    id: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
