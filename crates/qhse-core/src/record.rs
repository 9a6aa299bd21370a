//! The dynamic [`Record`] type and per-schema validation.
//!
//! A record is one row's worth of data as a field-name-to-value mapping.
//! Shapes are not closed at the type level; a record is well-formed with
//! respect to the [`EntitySchema`](crate::schema::EntitySchema) that
//! validated it. Undeclared keys are tolerated on input and ignored by the
//! store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  error::{Error, Result},
  schema::{EntitySchema, FieldDef, FieldKind},
};

// ─── Record ──────────────────────────────────────────────────────────────────

/// A field-name-to-value mapping for one entity row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
  pub fn new() -> Self { Self(Map::new()) }

  /// The record identifier, if one is present and textual.
  pub fn id(&self) -> Option<&str> {
    self.0.get("id").and_then(Value::as_str)
  }

  pub fn set_id(&mut self, id: String) {
    self.0.insert("id".to_owned(), Value::String(id));
  }

  pub fn get(&self, name: &str) -> Option<&Value> { self.0.get(name) }

  pub fn insert(&mut self, name: impl Into<String>, value: Value) {
    self.0.insert(name.into(), value);
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn check_field(
  resource: &'static str,
  field: &FieldDef,
  value: Option<&Value>,
) -> Result<()> {
  match field.kind {
    FieldKind::Text => match value {
      Some(Value::String(_)) => Ok(()),
      None | Some(Value::Null) => Err(Error::MissingField { resource, field: field.name }),
      Some(_) => Err(Error::InvalidField {
        resource,
        field: field.name,
        expected: "text",
      }),
    },
    FieldKind::OptionalText => match value {
      None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
      Some(_) => Err(Error::InvalidField {
        resource,
        field: field.name,
        expected: "text or null",
      }),
    },
    FieldKind::Integer => match value {
      Some(v) if v.as_i64().is_some() => Ok(()),
      None | Some(Value::Null) => Err(Error::MissingField { resource, field: field.name }),
      Some(_) => Err(Error::InvalidField {
        resource,
        field: field.name,
        expected: "an integer",
      }),
    },
    FieldKind::Real => match value {
      Some(v) if v.as_f64().is_some() => Ok(()),
      None | Some(Value::Null) => Err(Error::MissingField { resource, field: field.name }),
      Some(_) => Err(Error::InvalidField {
        resource,
        field: field.name,
        expected: "a number",
      }),
    },
  }
}

impl EntitySchema {
  /// Check `record` against this schema: every required field present and
  /// non-null with the declared type, and — for a composite entity — the
  /// child collection an array of well-formed row objects.
  ///
  /// No partial write can follow a failed validation; stores call this
  /// before touching the database.
  pub fn validate(&self, record: &Record) -> Result<()> {
    for field in self.fields {
      check_field(self.resource, field, record.get(field.name))?;
    }

    if let Some(children) = &self.children {
      // An absent collection is an empty one.
      let Some(value) = record.get(children.field) else {
        return Ok(());
      };
      let rows = value.as_array().ok_or(Error::InvalidChildRow {
        resource: self.resource,
        field:    children.field,
      })?;
      for row in rows {
        let obj = row.as_object().ok_or(Error::InvalidChildRow {
          resource: self.resource,
          field:    children.field,
        })?;
        // A caller-supplied child id is reused verbatim; it must be textual.
        if let Some(id) = obj.get("id")
          && !(id.is_string() || id.is_null())
        {
          return Err(Error::InvalidField {
            resource: self.resource,
            field:    "id",
            expected: "text or null",
          });
        }
        for field in children.fields {
          check_field(self.resource, field, obj.get(field.name))?;
        }
      }
    }

    Ok(())
  }
}
