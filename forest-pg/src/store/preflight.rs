//! Préconditions et opérations de table (truncate, comptage)

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tracing::info;

/// Tables requises avant tout import (créées par les migrations)
pub const REQUIRED_TABLES: &[&str] = &[
    "regions",
    "departements",
    "communes",
    "cadastre_parcelles",
    "forest_parcels",
];

/// Vérifie que toutes les tables requises existent.
///
/// # Errors
///
/// Précondition fatale: une table absente abandonne le run avant
/// toute étape.
pub async fn check_tables(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;

    for table in REQUIRED_TABLES {
        let exists = client
            .query_opt(
                "SELECT 1 FROM information_schema.tables WHERE table_name = $1",
                &[table],
            )
            .await
            .with_context(|| format!("Failed to check table '{}'", table))?
            .is_some();

        if !exists {
            anyhow::bail!("Table '{}' does not exist. Run migrations first.", table);
        }
    }

    info!("All required tables exist");
    Ok(())
}

/// Vide une table avant rechargement complet (sémantique truncate-and-reload).
///
/// `cascade` pour la hiérarchie administrative (clés référencées),
/// simple `RESTART IDENTITY` pour les tables de parcelles.
pub async fn truncate_table(pool: &Pool, table: &str, cascade: bool) -> Result<()> {
    let client = pool.get().await?;
    let sql = if cascade {
        format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table)
    } else {
        format!("TRUNCATE TABLE {} RESTART IDENTITY", table)
    };

    client
        .execute(&sql, &[])
        .await
        .with_context(|| format!("Failed to truncate {}", table))?;

    info!(table = table, "Truncated");
    Ok(())
}

/// Nombre de lignes d'une table (résumé final)
pub async fn table_count(pool: &Pool, table: &str) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(&format!("SELECT COUNT(*) FROM {}", table), &[])
        .await
        .with_context(|| format!("Failed to count {}", table))?;
    Ok(row.get(0))
}
