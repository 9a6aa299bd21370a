//! Conversion between JSON field values and SQLite column values.
//!
//! Text is stored as TEXT, integers as INTEGER, reals as REAL, and absent
//! optional fields as NULL. Validation runs before any binding, so the
//! fallback arms here are unreachable for records that passed it.

use qhse_core::FieldKind;
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;

pub fn to_sql(kind: FieldKind, value: Option<&JsonValue>) -> SqlValue {
  match (kind, value) {
    (_, None) | (_, Some(JsonValue::Null)) => SqlValue::Null,
    (FieldKind::Integer, Some(v)) => {
      v.as_i64().map(SqlValue::Integer).unwrap_or(SqlValue::Null)
    }
    (FieldKind::Real, Some(v)) => {
      v.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null)
    }
    (_, Some(JsonValue::String(s))) => SqlValue::Text(s.clone()),
    (_, Some(_)) => SqlValue::Null,
  }
}

pub fn from_sql(value: SqlValue) -> JsonValue {
  match value {
    SqlValue::Null => JsonValue::Null,
    SqlValue::Integer(i) => JsonValue::Number(i.into()),
    SqlValue::Real(f) => serde_json::Number::from_f64(f)
      .map(JsonValue::Number)
      .unwrap_or(JsonValue::Null),
    SqlValue::Text(s) => JsonValue::String(s),
    // No blob column exists in the generated schema.
    SqlValue::Blob(_) => JsonValue::Null,
  }
}
