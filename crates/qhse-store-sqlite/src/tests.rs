//! Integration tests for `SqliteStore` against an in-memory database.

use qhse_core::{
  record::Record,
  schema::{EntitySchema, FieldKind, REGISTRY},
  store::RecordStore,
};
use serde_json::{json, Value};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn schema(resource: &str) -> &'static EntitySchema {
  REGISTRY
    .iter()
    .find(|s| s.resource == resource)
    .expect("resource in registry")
}

fn record(value: Value) -> Record {
  serde_json::from_value(value).unwrap()
}

/// A draft filling every declared field with a distinguishable value.
fn draft_for(schema: &'static EntitySchema, marker: &str) -> Record {
  let mut draft = Record::new();
  for field in schema.fields {
    let value = match field.kind {
      FieldKind::Text | FieldKind::OptionalText => {
        json!(format!("{marker}-{}", field.name))
      }
      FieldKind::Integer => json!(42),
      FieldKind::Real => json!(9.5),
    };
    draft.insert(field.name, value);
  }
  if let Some(children) = schema.children {
    let mut row = serde_json::Map::new();
    for field in children.fields {
      row.insert(field.name.to_owned(), json!(format!("{marker}-{}", field.name)));
    }
    draft.insert(children.field, json!([row]));
  }
  draft
}

fn permis_draft(numero: &str, risques: Value) -> Record {
  record(json!({
    "numero": numero, "typeTravail": "Soudure", "localisation": "Atelier",
    "demandeur": "Dupont", "executant": "Martin", "departement": "Prod",
    "descriptionTache": "Réparation", "equipement": "Poste à souder",
    "dateDebut": "2026-02-01", "dateFin": "2026-02-01",
    "heureDebut": "08:00", "heureFin": "12:00", "statut": "En attente",
    "risques": risques
  }))
}

fn risques_of(permit: &Record) -> Vec<Value> {
  permit
    .get("risques")
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or_default()
}

// ─── Round trip ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_list_round_trips_every_entity() {
  let s = store().await;
  let mut seen_ids = Vec::new();

  for schema in REGISTRY {
    let draft = draft_for(schema, "v1");
    let created = s.create(schema, draft.clone()).await.unwrap();

    let id = created.id().expect("assigned id").to_owned();
    assert!(!id.is_empty());
    assert!(!seen_ids.contains(&id), "identifier reused across entities");
    seen_ids.push(id.clone());

    let listed = s.list(schema).await.unwrap();
    assert_eq!(listed.len(), 1, "{}", schema.resource);
    let got = &listed[0];
    assert_eq!(got.id(), Some(id.as_str()));
    for field in schema.fields {
      assert_eq!(
        got.get(field.name),
        draft.get(field.name),
        "{}.{}",
        schema.resource,
        field.name,
      );
    }
  }
}

#[tokio::test]
async fn client_supplied_id_is_overwritten_on_create() {
  let s = store().await;
  let mut draft = draft_for(schema("epi"), "v1");
  draft.set_id("attacker-chosen".to_owned());

  let created = s.create(schema("epi"), draft).await.unwrap();
  assert_ne!(created.id(), Some("attacker-chosen"));
}

#[tokio::test]
async fn absent_optional_fields_list_as_null() {
  let s = store().await;
  let draft = record(json!({
    "titre": "Décret 2026-12", "typeRapport": "Mensuel", "periode": "2026-01",
    "dateGeneration": "2026-02-01", "auteur": "HSE", "statut": "Émis"
  }));
  s.create(schema("rapports"), draft).await.unwrap();

  let listed = s.list(schema("rapports")).await.unwrap();
  assert_eq!(listed[0].get("commentaire"), Some(&Value::Null));
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_overwrites_every_field() {
  let s = store().await;
  let sch = schema("materiel");
  let created = s.create(sch, draft_for(sch, "before")).await.unwrap();
  let id = created.id().unwrap().to_owned();

  let replacement = draft_for(sch, "after");
  let updated = s.update(sch, id.clone(), replacement.clone()).await.unwrap();
  assert_eq!(updated.id(), Some(id.as_str()));

  let listed = s.list(sch).await.unwrap();
  assert_eq!(listed.len(), 1);
  for field in sch.fields {
    assert_eq!(listed[0].get(field.name), replacement.get(field.name));
  }
}

#[tokio::test]
async fn update_ignores_id_in_body() {
  let s = store().await;
  let sch = schema("visites");
  let created = s.create(sch, draft_for(sch, "v1")).await.unwrap();
  let id = created.id().unwrap().to_owned();

  let mut replacement = draft_for(sch, "v2");
  replacement.set_id("other-id".to_owned());
  let updated = s.update(sch, id.clone(), replacement).await.unwrap();
  assert_eq!(updated.id(), Some(id.as_str()));

  let listed = s.list(sch).await.unwrap();
  assert_eq!(listed[0].id(), Some(id.as_str()));
}

#[tokio::test]
async fn update_of_unknown_id_appears_successful() {
  // Mirrors the system being replaced: zero rows match, no error surfaces.
  let s = store().await;
  let sch = schema("formations");
  let echoed = s
    .update(sch, "no-such-row".to_owned(), draft_for(sch, "v1"))
    .await
    .unwrap();
  assert_eq!(echoed.id(), Some("no-such-row"));
  assert!(s.list(sch).await.unwrap().is_empty());
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_is_idempotent() {
  let s = store().await;
  let sch = schema("incidents");
  let created = s.create(sch, draft_for(sch, "v1")).await.unwrap();
  let id = created.id().unwrap().to_owned();

  s.delete(sch, id.clone()).await.unwrap();
  assert!(s.list(sch).await.unwrap().is_empty());
  // Second delete of the same id succeeds with no error.
  s.delete(sch, id).await.unwrap();
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn required_field_rejection_leaves_no_row() {
  let s = store().await;
  let sch = schema("formations");
  let mut draft = draft_for(sch, "v1");
  draft.0.remove("intitule");

  let err = s.create(sch, draft).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(qhse_core::Error::MissingField { field: "intitule", .. })
  ));
  assert!(s.list(sch).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_update_leaves_row_untouched() {
  let s = store().await;
  let sch = schema("plans");
  let original = draft_for(sch, "v1");
  let created = s.create(sch, original.clone()).await.unwrap();
  let id = created.id().unwrap().to_owned();

  let mut bad = draft_for(sch, "v2");
  bad.insert("avancement", json!("not a number"));
  assert!(s.update(sch, id, bad).await.is_err());

  let listed = s.list(sch).await.unwrap();
  assert_eq!(listed[0].get("titre"), original.get("titre"));
}

// ─── Composite aggregate ─────────────────────────────────────────────────────

#[tokio::test]
async fn permit_children_are_stored_in_supplied_order() {
  let s = store().await;
  let sch = schema("permis");
  let created = s
    .create(
      sch,
      permis_draft("PT-1", json!([
        { "risque": "Incendie", "niveau": "Haut", "mesures": "Extincteur" },
        { "risque": "Brûlure", "niveau": "Moyen", "mesures": "Gants" },
      ])),
    )
    .await
    .unwrap();

  let listed = s.list(sch).await.unwrap();
  assert_eq!(listed.len(), 1);
  let risques = risques_of(&listed[0]);
  assert_eq!(risques.len(), 2);
  assert_eq!(risques[0]["risque"], json!("Incendie"));
  assert_eq!(risques[1]["risque"], json!("Brûlure"));
  // Each row carries a generated id and the parent back-reference.
  for row in &risques {
    assert!(row["id"].as_str().is_some_and(|i| !i.is_empty()));
    assert_eq!(row["permis_id"], json!(created.id().unwrap()));
  }
}

#[tokio::test]
async fn permit_with_empty_risk_list_is_valid() {
  let s = store().await;
  let sch = schema("permis");
  s.create(sch, permis_draft("PT-2", json!([]))).await.unwrap();

  let listed = s.list(sch).await.unwrap();
  assert_eq!(risques_of(&listed[0]), Vec::<Value>::new());
}

#[tokio::test]
async fn composite_update_is_a_full_replace() {
  let s = store().await;
  let sch = schema("permis");
  let created = s
    .create(
      sch,
      permis_draft("PT-3", json!([
        { "risque": "r1", "niveau": "Haut", "mesures": "m1" },
        { "risque": "r2", "niveau": "Bas", "mesures": "m2" },
      ])),
    )
    .await
    .unwrap();
  let id = created.id().unwrap().to_owned();

  s.update(
    sch,
    id.clone(),
    permis_draft("PT-3", json!([
      { "risque": "r3", "niveau": "Moyen", "mesures": "m3" },
    ])),
  )
  .await
  .unwrap();

  let listed = s.list(sch).await.unwrap();
  let risques = risques_of(&listed[0]);
  assert_eq!(risques.len(), 1);
  assert_eq!(risques[0]["risque"], json!("r3"));

  // No r1/r2 residue anywhere in the child table.
  let orphans: i64 = s
    .conn
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT COUNT(*) FROM risques WHERE risque IN ('r1', 'r2')",
        [],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(orphans, 0);
}

#[tokio::test]
async fn composite_update_reuses_supplied_child_ids() {
  let s = store().await;
  let sch = schema("permis");
  let created = s
    .create(
      sch,
      permis_draft("PT-4", json!([
        { "risque": "r1", "niveau": "Haut", "mesures": "m1" },
      ])),
    )
    .await
    .unwrap();
  let id = created.id().unwrap().to_owned();
  let child_id = risques_of(&created)[0]["id"].as_str().unwrap().to_owned();

  let updated = s
    .update(
      sch,
      id,
      permis_draft("PT-4", json!([
        { "id": child_id, "risque": "r1", "niveau": "Haut", "mesures": "m1 révisée" },
        { "risque": "r-nouveau", "niveau": "Bas", "mesures": "m2" },
      ])),
    )
    .await
    .unwrap();

  let risques = risques_of(&updated);
  assert_eq!(risques[0]["id"], json!(child_id));
  assert_eq!(risques[0]["mesures"], json!("m1 révisée"));
  // The row without an id got a fresh one.
  assert!(risques[1]["id"].as_str().is_some_and(|i| !i.is_empty()));
  assert_ne!(risques[1]["id"], json!(child_id));
}

#[tokio::test]
async fn deleting_a_permit_removes_its_risk_rows() {
  let s = store().await;
  let sch = schema("permis");
  let kept = s
    .create(
      sch,
      permis_draft("PT-5", json!([
        { "risque": "garde", "niveau": "Bas", "mesures": "m" },
      ])),
    )
    .await
    .unwrap();
  let doomed = s
    .create(
      sch,
      permis_draft("PT-6", json!([
        { "risque": "a", "niveau": "Haut", "mesures": "m" },
        { "risque": "b", "niveau": "Haut", "mesures": "m" },
      ])),
    )
    .await
    .unwrap();

  s.delete(sch, doomed.id().unwrap().to_owned()).await.unwrap();

  let listed = s.list(sch).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].id(), kept.id());

  let remaining: i64 = s
    .conn
    .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM risques", [], |r| r.get(0))?))
    .await
    .unwrap();
  assert_eq!(remaining, 1);
}

#[tokio::test]
async fn foreign_key_cascade_covers_direct_parent_deletes() {
  // The store deletes child rows itself; the schema-level cascade is the
  // backstop. Exercise it by deleting the parent row with raw SQL.
  let s = store().await;
  let sch = schema("permis");
  let created = s
    .create(
      sch,
      permis_draft("PT-7", json!([
        { "risque": "a", "niveau": "Haut", "mesures": "m" },
      ])),
    )
    .await
    .unwrap();
  let id = created.id().unwrap().to_owned();

  let remaining: i64 = s
    .conn
    .call(move |conn| {
      conn.execute("DELETE FROM permis WHERE id = ?1", [&id])?;
      Ok(conn.query_row("SELECT COUNT(*) FROM risques", [], |r| r.get(0))?)
    })
    .await
    .unwrap();
  assert_eq!(remaining, 0);
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_order_is_unspecified_but_contents_are_complete() {
  // No ORDER BY is issued for top-level lists; compare as sets.
  let s = store().await;
  let sch = schema("ged");
  let mut expected = Vec::new();
  for marker in ["a", "b", "c"] {
    let created = s.create(sch, draft_for(sch, marker)).await.unwrap();
    expected.push(created.id().unwrap().to_owned());
  }

  let mut listed: Vec<String> = s
    .list(sch)
    .await
    .unwrap()
    .iter()
    .map(|r| r.id().unwrap().to_owned())
    .collect();
  listed.sort();
  expected.sort();
  assert_eq!(listed, expected);
}
