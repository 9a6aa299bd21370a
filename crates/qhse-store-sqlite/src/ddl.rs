//! DDL generation from the entity schema registry.
//!
//! Executed once at connection startup. Idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`, which is the only migration mechanism this
//! system carries.

use std::fmt::Write as _;

use qhse_core::{FieldKind, REGISTRY};

fn column_type(kind: FieldKind) -> &'static str {
  match kind {
    FieldKind::Text => "TEXT NOT NULL",
    FieldKind::OptionalText => "TEXT",
    FieldKind::Integer => "INTEGER NOT NULL",
    FieldKind::Real => "REAL NOT NULL",
  }
}

/// Full schema DDL for every registry entry, child tables included.
///
/// Column names are quoted because they are shared verbatim with the API
/// field names (camelCase, and a few that shadow SQL keywords).
pub fn schema_ddl() -> String {
  let mut ddl =
    String::from("PRAGMA journal_mode = WAL;\nPRAGMA foreign_keys = ON;\n\n");

  for schema in REGISTRY {
    writeln!(ddl, "CREATE TABLE IF NOT EXISTS {} (", schema.table).unwrap();
    write!(ddl, "    id TEXT PRIMARY KEY").unwrap();
    for field in schema.fields {
      write!(ddl, ",\n    \"{}\" {}", field.name, column_type(field.kind)).unwrap();
    }
    ddl.push_str("\n);\n\n");

    if let Some(children) = schema.children {
      writeln!(ddl, "CREATE TABLE IF NOT EXISTS {} (", children.table).unwrap();
      write!(
        ddl,
        "    id TEXT PRIMARY KEY,\n    \"{}\" TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE",
        children.parent_key, schema.table
      )
      .unwrap();
      for field in children.fields {
        write!(ddl, ",\n    \"{}\" {}", field.name, column_type(field.kind)).unwrap();
      }
      ddl.push_str("\n);\n\n");
      writeln!(
        ddl,
        "CREATE INDEX IF NOT EXISTS {table}_parent_idx ON {table}(\"{key}\");\n",
        table = children.table,
        key = children.parent_key,
      )
      .unwrap();
    }
  }

  ddl
}
