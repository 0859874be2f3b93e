//! Résolution de schéma pour les sources à variantes (BD Forêt)
//!
//! Les shapefiles BD Forêt changent de schéma selon le millésime. Plutôt
//! que de coder chaque variante, chaque champ canonique déclare une liste
//! de noms sources acceptables, par ordre de priorité. La résolution est
//! une fonction pure de (champs disponibles, table de candidats).

use std::collections::HashSet;

/// Un champ canonique et ses noms sources acceptables, du plus prioritaire
/// au moins prioritaire
#[derive(Debug, Clone, Copy)]
pub struct FieldCandidates {
    /// Nom du champ canonique (alias SQL cible)
    pub canonical: &'static str,

    /// Noms sources acceptables, par ordre de priorité
    pub candidates: &'static [&'static str],
}

/// Résolution d'un champ canonique contre une source concrète
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Nom du champ canonique
    pub canonical: &'static str,

    /// Champ source retenu, `None` si aucun candidat n'est présent
    pub source: Option<String>,
}

impl ResolvedField {
    /// Fragment de projection OGR SQL: `SRC AS alias`, ou `'' AS alias`
    /// quand aucun candidat ne correspond (défaut vide explicite, jamais
    /// un échec)
    pub fn to_sql(&self) -> String {
        match &self.source {
            Some(src) => format!("{} AS {}", src, self.canonical),
            None => format!("'' AS {}", self.canonical),
        }
    }
}

/// Projection résolue: un `ResolvedField` par champ canonique, dans
/// l'ordre de déclaration de la table de candidats
#[derive(Debug, Clone)]
pub struct SchemaMapping {
    fields: Vec<ResolvedField>,
}

impl SchemaMapping {
    /// Champs résolus, dans l'ordre de déclaration
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    /// Résolution d'un champ canonique par son nom
    pub fn get(&self, canonical: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.canonical == canonical)
    }
}

/// Résout une table de candidats contre l'ensemble des champs présents
/// dans la source.
///
/// Pour chaque champ canonique, le premier candidat présent (ordre de
/// priorité déclaré) est retenu. Sans side effects: fonction pure de
/// (champs disponibles, table de candidats).
pub fn resolve(table: &[FieldCandidates], available: &HashSet<String>) -> SchemaMapping {
    let fields = table
        .iter()
        .map(|fc| ResolvedField {
            canonical: fc.canonical,
            source: fc
                .candidates
                .iter()
                .find(|c| available.contains(**c))
                .map(|c| c.to_string()),
        })
        .collect();

    SchemaMapping { fields }
}

/// Couche OGR unique des shapefiles BD Forêt
pub const FOREST_LAYER: &str = "FORMATION_VEGETALE";

/// Table de candidats pour la couche végétation.
///
/// Schémas rencontrés selon les millésimes:
/// - ancien (mono-libellé):  DEP CYCLE ANREF TFIFN LIBELLE [LIBELLE2] TYPN NOM_TYPN
/// - nouveau (bi-essence):   CODE_TFV LIB_TFV ESSENCE1 ESSENCE2 CODE_COM …
/// - variante mixte:         CODE_TFV TFV ESSENCE ID …
///
/// Un nouveau millésime s'accommode en étendant ces listes, sans toucher
/// au code de résolution.
pub const FOREST_FIELDS: &[FieldCandidates] = &[
    FieldCandidates {
        canonical: "code_tfv",
        candidates: &["CODE_TFV", "TFIFN"],
    },
    FieldCandidates {
        canonical: "lib_tfv",
        candidates: &["LIB_TFV", "TFV", "LIBELLE"],
    },
    FieldCandidates {
        canonical: "essence1",
        candidates: &["ESSENCE1", "ESSENCE"],
    },
    FieldCandidates {
        canonical: "essence2",
        candidates: &["ESSENCE2"],
    },
    FieldCandidates {
        canonical: "commune",
        candidates: &["CODE_COM"],
    },
];

/// Construit la requête de projection OGR SQL pour la couche végétation.
///
/// Le département n'existe pas toujours dans la source: il est injecté
/// comme constante. L'ordre des colonnes suit la table `forest_parcels`.
pub fn forest_select(mapping: &SchemaMapping, departement: &str) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(6);
    for canonical in ["code_tfv", "lib_tfv", "essence1", "essence2"] {
        if let Some(field) = mapping.get(canonical) {
            parts.push(field.to_sql());
        }
    }
    parts.push(format!("'{}' AS departement", departement));
    if let Some(field) = mapping.get("commune") {
        parts.push(field.to_sql());
    }

    format!("SELECT {} FROM {}", parts.join(", "), FOREST_LAYER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_new_dual_essence_schema() {
        let available = fields(&["CODE_TFV", "LIB_TFV", "ESSENCE1", "ESSENCE2", "CODE_COM"]);
        let mapping = resolve(FOREST_FIELDS, &available);

        assert_eq!(
            mapping.get("code_tfv").unwrap().source.as_deref(),
            Some("CODE_TFV")
        );
        // LIB_TFV prime sur TFV et LIBELLE, par ordre de priorité
        assert_eq!(
            mapping.get("lib_tfv").unwrap().source.as_deref(),
            Some("LIB_TFV")
        );
        assert_eq!(
            mapping.get("essence1").unwrap().source.as_deref(),
            Some("ESSENCE1")
        );
        assert_eq!(
            mapping.get("essence2").unwrap().source.as_deref(),
            Some("ESSENCE2")
        );
    }

    #[test]
    fn test_resolve_old_single_label_schema() {
        let available = fields(&[
            "DEP", "CYCLE", "ANREF", "TFIFN", "LIBELLE", "LIBELLE2", "TYPN", "NOM_TYPN",
        ]);
        let mapping = resolve(FOREST_FIELDS, &available);

        assert_eq!(
            mapping.get("code_tfv").unwrap().source.as_deref(),
            Some("TFIFN")
        );
        assert_eq!(
            mapping.get("lib_tfv").unwrap().source.as_deref(),
            Some("LIBELLE")
        );
        assert_eq!(mapping.get("essence1").unwrap().source, None);
        assert_eq!(mapping.get("essence2").unwrap().source, None);
        assert_eq!(mapping.get("commune").unwrap().source, None);
    }

    #[test]
    fn test_resolve_mixed_variant_schema() {
        let available = fields(&["CODE_TFV", "TFV", "ESSENCE", "ID"]);
        let mapping = resolve(FOREST_FIELDS, &available);

        assert_eq!(
            mapping.get("lib_tfv").unwrap().source.as_deref(),
            Some("TFV")
        );
        assert_eq!(
            mapping.get("essence1").unwrap().source.as_deref(),
            Some("ESSENCE")
        );
        assert_eq!(mapping.get("essence2").unwrap().source, None);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let available = fields(&["LIB_TFV", "TFV", "LIBELLE"]);
        let a = resolve(FOREST_FIELDS, &available);
        let b = resolve(FOREST_FIELDS, &available);
        assert_eq!(a.fields(), b.fields());
        assert_eq!(a.get("lib_tfv").unwrap().source.as_deref(), Some("LIB_TFV"));
    }

    #[test]
    fn test_unresolved_field_emits_empty_literal() {
        let field = ResolvedField {
            canonical: "essence2",
            source: None,
        };
        assert_eq!(field.to_sql(), "'' AS essence2");
    }

    #[test]
    fn test_forest_select_new_schema() {
        let available = fields(&["CODE_TFV", "LIB_TFV", "ESSENCE1", "ESSENCE2", "CODE_COM"]);
        let mapping = resolve(FOREST_FIELDS, &available);
        let sql = forest_select(&mapping, "78");

        assert_eq!(
            sql,
            "SELECT CODE_TFV AS code_tfv, LIB_TFV AS lib_tfv, \
             ESSENCE1 AS essence1, ESSENCE2 AS essence2, \
             '78' AS departement, CODE_COM AS commune \
             FROM FORMATION_VEGETALE"
        );
    }

    #[test]
    fn test_forest_select_empty_source() {
        let mapping = resolve(FOREST_FIELDS, &HashSet::new());
        let sql = forest_select(&mapping, "95");

        assert!(sql.starts_with("SELECT '' AS code_tfv, '' AS lib_tfv"));
        assert!(sql.contains("'95' AS departement"));
        assert!(sql.ends_with("FROM FORMATION_VEGETALE"));
    }
}
