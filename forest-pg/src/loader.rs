//! Chargement par lots avec isolation des échecs
//!
//! Le batch est la seule unité transactionnelle: inséré en entier ou
//! annulé en entier. Un batch en échec est comptabilisé puis oublié,
//! le chargement continue avec le batch suivant, sans abandon du run
//! ni effet sur les batches déjà commités.

use anyhow::{Context, Result};
use deadpool_postgres::{Object, Pool};
use tracing::{debug, warn};

use crate::rows::StoreRow;

/// Compteurs courants d'un chargement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Lignes commitées
    pub accepted: u64,
    /// Lignes des batches annulés (+ fichiers illisibles en cours
    /// d'accumulation)
    pub failed: u64,
}

impl LoadStats {
    /// Total observé: accepted + failed (les lignes filtrées pré-batch
    /// n'apparaissent pas ici)
    pub fn total(&self) -> u64 {
        self.accepted + self.failed
    }

    /// Écart entre deux instantanés (comptabilité par département)
    pub fn delta_since(&self, earlier: &LoadStats) -> LoadStats {
        LoadStats {
            accepted: self.accepted - earlier.accepted,
            failed: self.failed - earlier.failed,
        }
    }
}

/// Chargeur par lots pour un type de ligne canonique
pub struct BatchLoader<'a, R: StoreRow> {
    pool: &'a Pool,
    capacity: usize,
    buffer: Vec<R>,
    stats: LoadStats,
}

impl<'a, R: StoreRow> BatchLoader<'a, R> {
    /// Crée un chargeur de capacité `capacity` (500 en configuration
    /// de référence)
    pub fn new(pool: &'a Pool, capacity: usize) -> Self {
        Self {
            pool,
            capacity: capacity.max(1),
            buffer: Vec::with_capacity(capacity),
            stats: LoadStats::default(),
        }
    }

    /// Compteurs courants
    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Comptabilise des lignes perdues hors batch (document source
    /// malformé en cours d'accumulation)
    pub fn record_failed(&mut self, rows: u64) {
        self.stats.failed += rows;
    }

    /// Bufferise une ligne; insère le batch quand la capacité est atteinte.
    ///
    /// # Errors
    ///
    /// Seule l'acquisition de connexion est fatale; un échec d'insertion
    /// est isolé au batch et comptabilisé.
    pub async fn push(&mut self, row: R) -> Result<()> {
        self.buffer.push(row);
        if self.buffer.len() >= self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Insère le batch partiel en attente, avec la même comptabilité
    /// succès/échec qu'un batch plein
    pub async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.buffer);

        let mut client = self
            .pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        match insert_batch(&mut client, &rows).await {
            Ok(()) => {
                self.stats.accepted += rows.len() as u64;
                debug!(
                    table = R::TABLE,
                    rows = rows.len(),
                    "Batch committed"
                );
            }
            Err(e) => {
                // Rollback du batch seul; les batches précédents restent commités
                self.stats.failed += rows.len() as u64;
                warn!(
                    table = R::TABLE,
                    rows = rows.len(),
                    error = %e,
                    "Batch rolled back"
                );
            }
        }

        Ok(())
    }

    /// Termine le chargement: flush du reliquat et compteurs finaux
    pub async fn finish(mut self) -> Result<LoadStats> {
        self.flush().await?;
        Ok(self.stats)
    }
}

/// Insère un batch dans une transaction unique.
///
/// En cas d'erreur la transaction est droppée sans commit, ce qui vaut
/// rollback côté store.
async fn insert_batch<R: StoreRow>(client: &mut Object, rows: &[R]) -> Result<()> {
    let tx = client.transaction().await.context("Failed to begin batch")?;
    let stmt = tx
        .prepare(R::INSERT_SQL)
        .await
        .with_context(|| format!("Failed to prepare insert for {}", R::TABLE))?;

    for row in rows {
        tx.execute(&stmt, &row.params()).await?;
    }

    tx.commit().await.context("Failed to commit batch")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_total() {
        let stats = LoadStats {
            accepted: 1200,
            failed: 500,
        };
        assert_eq!(stats.total(), 1700);
    }

    #[test]
    fn test_stats_delta() {
        let before = LoadStats {
            accepted: 100,
            failed: 10,
        };
        let after = LoadStats {
            accepted: 350,
            failed: 10,
        };
        assert_eq!(
            after.delta_since(&before),
            LoadStats {
                accepted: 250,
                failed: 0
            }
        );
    }

    // Le comportement transactionnel (commit/rollback par batch) est
    // couvert par tests/postgres_integration.rs
}
