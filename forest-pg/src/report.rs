//! Rapport de run avec graceful degradation
//!
//! Collecte les issues par source (ou par département au sein d'une
//! source) et les comptes de lignes finaux par table. Les issues
//! partielles sont visibles dans le rapport mais ne changent pas le
//! statut de sortie du process.

use std::time::Duration;

use serde::Serialize;

use crate::loader::LoadStats;

/// Statut terminal d'une source ou d'un département
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    /// Fichier ou répertoire source absent
    SkippedMissing,
    /// Source trouvée mais sans features exploitables
    SkippedEmpty,
    /// Chargement terminé (avec éventuels batches en échec)
    Completed,
    /// Échec de conversion ou document illisible
    Failed,
}

/// Issue d'une source (ou d'un département au sein d'une source)
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    /// Identifiant de la source (ex: "regions", "cadastre/78")
    pub source: String,
    /// Statut terminal
    pub status: OutcomeStatus,
    /// Lignes acceptées
    pub accepted: u64,
    /// Lignes en échec
    pub failed: u64,
    /// Diagnostic tronqué (échecs de l'outil externe)
    pub diagnostic: Option<String>,
}

/// Rapport complet d'un run d'import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Issues par source, dans l'ordre d'exécution
    pub outcomes: Vec<SourceOutcome>,
    /// Comptes finaux par table
    pub table_counts: Vec<(String, i64)>,
    /// Durée du run
    pub duration_secs: f64,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une source absente
    pub fn record_skipped_missing(&mut self, source: &str) {
        self.push(source, OutcomeStatus::SkippedMissing, LoadStats::default(), None);
    }

    /// Enregistre une source trouvée mais vide
    pub fn record_skipped_empty(&mut self, source: &str) {
        self.push(source, OutcomeStatus::SkippedEmpty, LoadStats::default(), None);
    }

    /// Enregistre un chargement terminé avec ses compteurs
    pub fn record_completed(&mut self, source: &str, stats: LoadStats) {
        self.push(source, OutcomeStatus::Completed, stats, None);
    }

    /// Enregistre un échec avec diagnostic
    pub fn record_failed(&mut self, source: &str, diagnostic: impl Into<String>) {
        self.push(
            source,
            OutcomeStatus::Failed,
            LoadStats::default(),
            Some(diagnostic.into()),
        );
    }

    fn push(
        &mut self,
        source: &str,
        status: OutcomeStatus,
        stats: LoadStats,
        diagnostic: Option<String>,
    ) {
        self.outcomes.push(SourceOutcome {
            source: source.to_string(),
            status,
            accepted: stats.accepted,
            failed: stats.failed,
            diagnostic,
        });
    }

    /// Enregistre le compte final d'une table
    pub fn record_table_count(&mut self, table: &str, count: i64) {
        self.table_counts.push((table.to_string(), count));
    }

    /// Définit la durée du run
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Lignes acceptées tous chargements confondus
    pub fn total_accepted(&self) -> u64 {
        self.outcomes.iter().map(|o| o.accepted).sum()
    }

    /// Lignes en échec tous chargements confondus
    pub fn total_failed(&self) -> u64 {
        self.outcomes.iter().map(|o| o.failed).sum()
    }

    /// Vrai si au moins une issue n'est pas un succès complet
    pub fn has_degradations(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status != OutcomeStatus::Completed || o.failed > 0)
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(67));
        println!(" Import Summary");
        println!("{}", "=".repeat(67));

        println!("\nDuration: {:.2}s", self.duration_secs);
        println!(
            "Rows: {} accepted, {} failed",
            self.total_accepted(),
            self.total_failed()
        );

        println!("\n--- SOURCES ---");
        for o in &self.outcomes {
            match o.status {
                OutcomeStatus::Completed => println!(
                    "  {:<24} completed ({} accepted, {} failed)",
                    o.source, o.accepted, o.failed
                ),
                OutcomeStatus::SkippedMissing => {
                    println!("  {:<24} skipped (not found)", o.source)
                }
                OutcomeStatus::SkippedEmpty => println!("  {:<24} skipped (empty)", o.source),
                OutcomeStatus::Failed => println!(
                    "  {:<24} FAILED: {}",
                    o.source,
                    o.diagnostic.as_deref().unwrap_or("unknown")
                ),
            }
        }

        if !self.table_counts.is_empty() {
            println!("\n--- TABLES ---");
            for (table, count) in &self.table_counts {
                println!("  {:<25} {} rows", table, count);
            }
        }

        println!("\n{}", "=".repeat(67));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_default() {
        let report = ImportReport::new();
        assert!(report.outcomes.is_empty());
        assert!(!report.has_degradations());
    }

    #[test]
    fn test_record_completed() {
        let mut report = ImportReport::new();
        report.record_completed(
            "regions",
            LoadStats {
                accepted: 18,
                failed: 0,
            },
        );

        assert_eq!(report.total_accepted(), 18);
        assert_eq!(report.total_failed(), 0);
        assert!(!report.has_degradations());
    }

    #[test]
    fn test_completed_with_failed_batches_is_degraded() {
        let mut report = ImportReport::new();
        report.record_completed(
            "cadastre/78",
            LoadStats {
                accepted: 1500,
                failed: 500,
            },
        );

        assert!(report.has_degradations());
        assert_eq!(report.total_failed(), 500);
    }

    #[test]
    fn test_record_skipped_and_failed() {
        let mut report = ImportReport::new();
        report.record_skipped_missing("bdforet/95");
        report.record_failed("bdforet/91", "ogr2ogr exited with status 1");

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::SkippedMissing);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
        assert!(report.outcomes[1].diagnostic.is_some());
        assert!(report.has_degradations());
    }

    #[test]
    fn test_table_counts() {
        let mut report = ImportReport::new();
        report.record_table_count("regions", 18);
        report.record_table_count("communes", 412);

        assert_eq!(report.table_counts.len(), 2);
        assert_eq!(report.table_counts[0], ("regions".to_string(), 18));
    }
}
