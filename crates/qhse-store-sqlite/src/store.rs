//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use qhse_core::{
  id::new_id,
  record::Record,
  schema::{ChildCollection, EntitySchema, FieldDef},
  store::RecordStore,
};
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;

use crate::{
  ddl::schema_ddl,
  encode::{from_sql, to_sql},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A QHSE record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Each store
/// operation runs as one scoped `conn.call`, so the connection is handed
/// back on every exit path.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let ddl = schema_ddl();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Project `draft` onto the declared fields: `id` fixed to the given one,
/// undeclared keys dropped, absent optional fields made explicit nulls.
fn normalize(schema: &EntitySchema, draft: &Record, id: &str) -> Record {
  let mut record = Record::new();
  record.set_id(id.to_owned());
  for field in schema.fields {
    let value = draft.get(field.name).cloned().unwrap_or(JsonValue::Null);
    record.insert(field.name, value);
  }
  record
}

/// Child rows in supplied order, with the parent back-reference set and ids
/// resolved: a supplied id is reused verbatim, a missing one is freshly
/// generated.
fn normalize_children(
  children: &ChildCollection,
  draft: &Record,
  parent_id: &str,
) -> Vec<Record> {
  let rows = draft
    .get(children.field)
    .and_then(JsonValue::as_array)
    .cloned()
    .unwrap_or_default();

  rows
    .iter()
    .filter_map(JsonValue::as_object)
    .map(|row| {
      let mut child = Record::new();
      let id = row
        .get("id")
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
        .unwrap_or_else(new_id);
      child.set_id(id);
      child.insert(children.parent_key, JsonValue::String(parent_id.to_owned()));
      for field in children.fields {
        child.insert(field.name, row.get(field.name).cloned().unwrap_or(JsonValue::Null));
      }
      child
    })
    .collect()
}

fn rows_to_json(rows: &[Record]) -> JsonValue {
  JsonValue::Array(rows.iter().map(|r| JsonValue::Object(r.0.clone())).collect())
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// Table and column names are interpolated from the static registry only,
// never from request input. Field values always travel as parameters.

fn quote_join(names: &[&str]) -> String {
  names
    .iter()
    .map(|n| format!("\"{n}\""))
    .collect::<Vec<_>>()
    .join(", ")
}

fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

fn entity_columns(schema: &EntitySchema) -> Vec<&'static str> {
  std::iter::once("id")
    .chain(schema.fields.iter().map(|f| f.name))
    .collect()
}

fn child_columns(children: &ChildCollection) -> Vec<&'static str> {
  ["id", children.parent_key]
    .into_iter()
    .chain(children.fields.iter().map(|f| f.name))
    .collect()
}

fn field_params(fields: &[FieldDef], record: &Record) -> Vec<SqlValue> {
  fields
    .iter()
    .map(|f| to_sql(f.kind, record.get(f.name)))
    .collect()
}

fn insert_entity(
  conn: &rusqlite::Connection,
  schema: &EntitySchema,
  record: &Record,
) -> rusqlite::Result<()> {
  let columns = entity_columns(schema);
  let sql = format!(
    "INSERT INTO {} ({}) VALUES ({})",
    schema.table,
    quote_join(&columns),
    placeholders(columns.len()),
  );
  let mut params = Vec::with_capacity(columns.len());
  params.push(SqlValue::Text(record.id().unwrap_or_default().to_owned()));
  params.extend(field_params(schema.fields, record));
  conn.execute(&sql, rusqlite::params_from_iter(params))?;
  Ok(())
}

fn insert_child(
  conn: &rusqlite::Connection,
  children: &ChildCollection,
  record: &Record,
) -> rusqlite::Result<()> {
  let columns = child_columns(children);
  let sql = format!(
    "INSERT INTO {} ({}) VALUES ({})",
    children.table,
    quote_join(&columns),
    placeholders(columns.len()),
  );
  let mut params = Vec::with_capacity(columns.len());
  params.push(SqlValue::Text(record.id().unwrap_or_default().to_owned()));
  params.push(to_sql(
    qhse_core::FieldKind::Text,
    record.get(children.parent_key),
  ));
  params.extend(field_params(children.fields, record));
  conn.execute(&sql, rusqlite::params_from_iter(params))?;
  Ok(())
}

/// Overwrite every non-id column of the addressed row. Zero matched rows is
/// not distinguished from one.
fn update_entity(
  conn: &rusqlite::Connection,
  schema: &EntitySchema,
  id: &str,
  record: &Record,
) -> rusqlite::Result<()> {
  let assignments = schema
    .fields
    .iter()
    .enumerate()
    .map(|(i, f)| format!("\"{}\" = ?{}", f.name, i + 2))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!("UPDATE {} SET {} WHERE id = ?1", schema.table, assignments);
  let mut params = Vec::with_capacity(schema.fields.len() + 1);
  params.push(SqlValue::Text(id.to_owned()));
  params.extend(field_params(schema.fields, record));
  conn.execute(&sql, rusqlite::params_from_iter(params))?;
  Ok(())
}

fn row_to_record(
  row: &rusqlite::Row<'_>,
  columns: &[&'static str],
) -> rusqlite::Result<Record> {
  let mut record = Record::new();
  for (i, name) in columns.iter().enumerate() {
    let value: SqlValue = row.get(i)?;
    record.insert(*name, from_sql(value));
  }
  Ok(record)
}

fn select_entities(
  conn: &rusqlite::Connection,
  schema: &EntitySchema,
) -> rusqlite::Result<Vec<Record>> {
  let columns = entity_columns(schema);
  let sql = format!("SELECT {} FROM {}", quote_join(&columns), schema.table);
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map([], |row| row_to_record(row, &columns))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn select_children(
  conn: &rusqlite::Connection,
  children: &ChildCollection,
  parent_id: &str,
) -> rusqlite::Result<Vec<Record>> {
  let columns = child_columns(children);
  // rowid order preserves the order the rows were supplied in.
  let sql = format!(
    "SELECT {} FROM {} WHERE \"{}\" = ?1 ORDER BY rowid",
    quote_join(&columns),
    children.table,
    children.parent_key,
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map([parent_id], |row| row_to_record(row, &columns))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn list(&self, schema: &'static EntitySchema) -> Result<Vec<Record>> {
    let records = self
      .conn
      .call(move |conn| {
        let mut records = select_entities(conn, schema)?;
        if let Some(children) = schema.children {
          for record in &mut records {
            let parent_id = record.id().unwrap_or_default().to_owned();
            let rows = select_children(conn, &children, &parent_id)?;
            record.insert(children.field, rows_to_json(&rows));
          }
        }
        Ok(records)
      })
      .await?;
    Ok(records)
  }

  async fn create(&self, schema: &'static EntitySchema, draft: Record) -> Result<Record> {
    schema.validate(&draft)?;

    let id = new_id();
    let mut record = normalize(schema, &draft, &id);
    let child_rows = schema
      .children
      .map(|children| normalize_children(&children, &draft, &id));
    if let (Some(children), Some(rows)) = (schema.children, &child_rows) {
      record.insert(children.field, rows_to_json(rows));
    }

    let stored = record.clone();
    self
      .conn
      .call(move |conn| {
        match (schema.children, child_rows) {
          (Some(children), Some(rows)) => {
            // One transaction per aggregate: the parent row and its risk
            // rows commit or roll back together.
            let tx = conn.transaction()?;
            insert_entity(&tx, schema, &record)?;
            for row in &rows {
              insert_child(&tx, &children, row)?;
            }
            tx.commit()?;
          }
          _ => insert_entity(conn, schema, &record)?,
        }
        Ok(())
      })
      .await?;

    Ok(stored)
  }

  async fn update(
    &self,
    schema: &'static EntitySchema,
    id: String,
    draft: Record,
  ) -> Result<Record> {
    schema.validate(&draft)?;

    let mut record = normalize(schema, &draft, &id);
    let child_rows = schema
      .children
      .map(|children| normalize_children(&children, &draft, &id));
    if let (Some(children), Some(rows)) = (schema.children, &child_rows) {
      record.insert(children.field, rows_to_json(rows));
    }

    let stored = record.clone();
    self
      .conn
      .call(move |conn| {
        match (schema.children, child_rows) {
          (Some(children), Some(rows)) => {
            // Full replace of the owned collection: existing rows go,
            // supplied rows come back, all under one transaction.
            let tx = conn.transaction()?;
            update_entity(&tx, schema, &id, &record)?;
            let sql = format!(
              "DELETE FROM {} WHERE \"{}\" = ?1",
              children.table, children.parent_key,
            );
            tx.execute(&sql, [&id])?;
            for row in &rows {
              insert_child(&tx, &children, row)?;
            }
            tx.commit()?;
          }
          _ => update_entity(conn, schema, &id, &record)?,
        }
        Ok(())
      })
      .await?;

    Ok(stored)
  }

  async fn delete(&self, schema: &'static EntitySchema, id: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let parent_sql = format!("DELETE FROM {} WHERE id = ?1", schema.table);
        if let Some(children) = schema.children {
          // The FK cascade would cover the child rows on its own; the
          // explicit delete keeps the aggregate operation self-contained.
          let tx = conn.transaction()?;
          let child_sql = format!(
            "DELETE FROM {} WHERE \"{}\" = ?1",
            children.table, children.parent_key,
          );
          tx.execute(&child_sql, [&id])?;
          tx.execute(&parent_sql, [&id])?;
          tx.commit()?;
        } else {
          conn.execute(&parent_sql, [&id])?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }
}
