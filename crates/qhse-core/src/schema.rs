//! The entity schema registry.
//!
//! One [`EntitySchema`] per resource type, declaring its API path segment,
//! backing table, and ordered field list. The registry is a `'static` table
//! built at compile time and never mutated; routes are generated by
//! iterating it, so every reachable endpoint has a schema by construction.
//!
//! Field and table names are French because they are shared verbatim with
//! the column names of existing deployments.

// ─── Field definitions ───────────────────────────────────────────────────────

/// The storage type and nullability of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  /// Required text; non-null at persistence time.
  Text,
  /// Nullable text; may be absent or null.
  OptionalText,
  /// Required integer.
  Integer,
  /// Required real.
  Real,
}

/// One named, typed field of an entity record.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
  pub name: &'static str,
  pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldDef {
  FieldDef { name, kind: FieldKind::Text }
}

const fn opt(name: &'static str) -> FieldDef {
  FieldDef { name, kind: FieldKind::OptionalText }
}

const fn int(name: &'static str) -> FieldDef {
  FieldDef { name, kind: FieldKind::Integer }
}

const fn real(name: &'static str) -> FieldDef {
  FieldDef { name, kind: FieldKind::Real }
}

// ─── Schemas ─────────────────────────────────────────────────────────────────

/// An owned child collection of a composite entity (risk rows of a permit).
///
/// Child rows have no independent lifecycle: they are replaced wholesale on
/// parent update and removed with the parent on delete.
#[derive(Debug, Clone, Copy)]
pub struct ChildCollection {
  /// Record key under which the rows travel in request/response bodies.
  pub field:      &'static str,
  pub table:      &'static str,
  /// Column of the child table holding the parent identifier.
  pub parent_key: &'static str,
  pub fields:     &'static [FieldDef],
}

/// The static description of one resource type's storage shape.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
  /// URL segment under `/api/`.
  pub resource: &'static str,
  pub table:    &'static str,
  pub fields:   &'static [FieldDef],
  pub children: Option<ChildCollection>,
}

// ─── Registry ────────────────────────────────────────────────────────────────

const fn entity(
  resource: &'static str,
  table: &'static str,
  fields: &'static [FieldDef],
) -> EntitySchema {
  EntitySchema { resource, table, fields, children: None }
}

/// Every resource type served by the API, in route-registration order.
pub const REGISTRY: &[EntitySchema] = &[
  entity("formations", "formations", &[
    text("nom"),
    text("prenom"),
    text("departement"),
    text("fonction"),
    text("typeFormation"),
    text("intitule"),
    text("centreFormation"),
    text("dateFormation"),
    text("dateExpiration"),
  ]),
  entity("materiel", "materiel", &[
    text("categorie"),
    text("designation"),
    text("numeroSerie"),
    text("caracteristiques"),
    text("dateControle"),
    text("prochainControle"),
    text("statut"),
  ]),
  entity("visites", "visites", &[
    text("nom"),
    text("prenom"),
    text("departement"),
    text("fonction"),
    text("typeVisite"),
    text("intitule"),
    text("centreMedical"),
    text("dateVisite"),
    text("dateExpiration"),
  ]),
  entity("plans", "plans", &[
    text("titre"),
    text("description"),
    text("responsable"),
    text("departement"),
    text("dateDebut"),
    text("dateEcheance"),
    text("priorite"),
    int("avancement"),
    text("statut"),
    text("processus"),
    opt("mesureEfficacite"),
    opt("commentaire"),
  ]),
  entity("epi", "epi", &[
    text("employe"),
    text("departement"),
    text("typeEPI"),
    text("marque"),
    text("taille"),
    text("dateRemise"),
    text("dateExpiration"),
    text("statut"),
  ]),
  entity("incidents", "incidents", &[
    text("type"),
    text("typeIncident"),
    text("gravite"),
    text("date"),
    text("heure"),
    text("lieu"),
    text("description"),
    text("personne"),
    opt("temoin"),
    opt("action"),
    text("statut"),
  ]),
  EntitySchema {
    resource: "permis",
    table:    "permis",
    fields:   &[
      text("numero"),
      text("typeTravail"),
      text("localisation"),
      text("demandeur"),
      text("executant"),
      text("departement"),
      text("descriptionTache"),
      text("equipement"),
      text("dateDebut"),
      text("dateFin"),
      text("heureDebut"),
      text("heureFin"),
      text("statut"),
    ],
    children: Some(ChildCollection {
      field:      "risques",
      table:      "risques",
      parent_key: "permis_id",
      fields:     &[text("risque"), text("niveau"), text("mesures")],
    }),
  },
  entity("ged", "ged", &[
    text("titre"),
    text("type"),
    text("categorie"),
    opt("description"),
    text("dateCreation"),
    text("dateModification"),
    text("auteur"),
    text("statut"),
    opt("fichier"),
  ]),
  entity("planformations", "planformations", &[
    text("intitule"),
    text("typeFormation"),
    text("description"),
    text("publicCible"),
    text("formateur"),
    text("dateDebut"),
    text("dateFin"),
    text("duree"),
    text("lieu"),
    real("cout"),
    text("statut"),
  ]),
  entity("planninghse", "planninghse", &[
    text("titre"),
    text("typeActivite"),
    text("description"),
    text("dateDebut"),
    text("dateFin"),
    text("heureDebut"),
    text("heureFin"),
    text("responsable"),
    text("lieu"),
    text("statut"),
    text("priorite"),
  ]),
  entity("veillereglementaire", "veillereglementaire", &[
    text("titre"),
    text("reference"),
    text("typeReglementation"),
    text("organisme"),
    text("datePublication"),
    text("dateApplication"),
    text("description"),
    text("statut"),
    text("impact"),
  ]),
  entity("aspects-environnementaux", "aspects_environnementaux", &[
    text("type"),
    text("categorie"),
    text("aspect"),
    opt("activite_source"),
    opt("localisation"),
    opt("description"),
    opt("condition_fonctionnement"),
    opt("impact_environnemental"),
    opt("criticite"),
    opt("statut"),
    opt("indicateur"),
    opt("unite_mesure"),
    opt("methode_suivi"),
    opt("frequence_mesure"),
    opt("cible"),
    opt("objectif"),
    opt("donnees_mesurees"),
    opt("date_derniere_mesure"),
    opt("responsable"),
    opt("mesures_maitrise"),
    opt("plan_actions"),
    opt("conformite_reglementaire"),
    opt("commentaires"),
  ]),
  entity("rapports", "rapports", &[
    text("titre"),
    text("typeRapport"),
    text("periode"),
    text("dateGeneration"),
    text("auteur"),
    text("statut"),
    opt("commentaire"),
  ]),
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resource_tags_and_tables_are_unique() {
    let mut resources: Vec<_> = REGISTRY.iter().map(|s| s.resource).collect();
    let mut tables: Vec<_> = REGISTRY.iter().map(|s| s.table).collect();
    resources.sort_unstable();
    tables.sort_unstable();
    resources.windows(2).for_each(|w| assert_ne!(w[0], w[1]));
    tables.windows(2).for_each(|w| assert_ne!(w[0], w[1]));
  }

  #[test]
  fn only_permis_is_composite() {
    let composite: Vec<_> = REGISTRY
      .iter()
      .filter(|s| s.children.is_some())
      .map(|s| s.resource)
      .collect();
    assert_eq!(composite, ["permis"]);
  }

  #[test]
  fn no_field_is_named_id() {
    for schema in REGISTRY {
      assert!(schema.fields.iter().all(|f| f.name != "id"));
      if let Some(children) = &schema.children {
        assert!(children.fields.iter().all(|f| f.name != "id"));
        assert!(children.fields.iter().all(|f| f.name != children.parent_key));
      }
    }
  }
}
