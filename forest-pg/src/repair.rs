//! Réparation des références hiérarchiques manquantes par contenance
//! spatiale
//!
//! Passe corrective unique, exécutée après le chargement en masse de
//! l'entité enfant, jamais entrelacée avec l'insertion.

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tracing::info;

/// Lien parent→enfant à réparer
#[derive(Debug, Clone, Copy)]
pub struct SpatialLink {
    /// Table enfant (ex: departements)
    pub child_table: &'static str,
    /// Colonne de référence parente potentiellement NULL
    pub child_ref_col: &'static str,
    /// Table parente (ex: regions)
    pub parent_table: &'static str,
}

/// Lien departement.region_code ← regions.code
pub const DEPARTEMENT_REGION: SpatialLink = SpatialLink {
    child_table: "departements",
    child_ref_col: "region_code",
    parent_table: "regions",
};

/// Requête de réparation.
///
/// Quand le centroïde tombe dans plusieurs géométries parentes
/// (frontières qui se recouvrent), le parent de plus petite surface
/// l'emporte (départage déterministe via `ORDER BY ST_Area`).
/// Les enfants sans parent contenant restent NULL.
fn repair_sql(link: &SpatialLink) -> String {
    format!(
        "UPDATE {child} c SET {col} = (\
           SELECT p.code FROM {parent} p \
           WHERE ST_Within(ST_Centroid(c.geom), p.geom) \
           ORDER BY ST_Area(p.geom) ASC, p.code ASC \
           LIMIT 1\
         ) \
         WHERE c.{col} IS NULL \
         AND EXISTS (\
           SELECT 1 FROM {parent} p \
           WHERE ST_Within(ST_Centroid(c.geom), p.geom)\
         )",
        child = link.child_table,
        col = link.child_ref_col,
        parent = link.parent_table,
    )
}

/// Renseigne la référence parente de chaque ligne enfant dont elle est
/// NULL et dont le centroïde tombe dans une géométrie parente.
///
/// Retourne le nombre de lignes réparées.
pub async fn resolve_missing_parents(pool: &Pool, link: &SpatialLink) -> Result<u64> {
    let client = pool.get().await?;

    let repaired = client
        .execute(&repair_sql(link), &[])
        .await
        .with_context(|| {
            format!(
                "Failed to repair {}.{} from {}",
                link.child_table, link.child_ref_col, link.parent_table
            )
        })?;

    info!(
        child = link.child_table,
        parent = link.parent_table,
        repaired = repaired,
        "Spatial link repair"
    );
    Ok(repaired)
}
