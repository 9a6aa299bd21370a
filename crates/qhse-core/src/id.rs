//! Record identifier generation.
//!
//! Identifiers are assigned by the store at creation and are immutable
//! thereafter. They are never reused, and client-supplied values are
//! overwritten on create.

use uuid::Uuid;

/// Generate a fresh record identifier: a hyphenated lowercase UUID v4.
pub fn new_id() -> String { Uuid::new_v4().hyphenated().to_string() }
