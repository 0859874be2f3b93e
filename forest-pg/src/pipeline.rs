//! Orchestration d'un run d'import complet
//!
//! Trois étapes indépendantes: limites administratives (régions,
//! départements + réparation spatiale, communes), parcelles cadastrales
//! par département, BD Forêt par département via l'outil de conversion
//! externe. Une source absente ou malformée est une issue enregistrée,
//! jamais un abandon du run; seules les préconditions sont fatales.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tracing::{info, warn};

use bdsource::{read_feature_collection, Feature, SourceError};

use crate::config::ImportConfig;
use crate::convert::{ConversionOutcome, ShapefileConverter, BUNDLE_BASENAME};
use crate::loader::{BatchLoader, LoadStats};
use crate::repair;
use crate::report::ImportReport;
use crate::rows::{CommuneRow, DepartementRow, ParcelleRow, RegionRow};
use crate::store;

/// Pipeline d'import séquentiel
pub struct ImportPipeline {
    config: ImportConfig,
    pool: Pool,
    ogr_dsn: String,
}

impl ImportPipeline {
    pub fn new(config: ImportConfig, pool: Pool, ogr_dsn: String) -> Self {
        Self {
            config,
            pool,
            ogr_dsn,
        }
    }

    /// Exécute le run complet et retourne le rapport.
    ///
    /// # Errors
    ///
    /// Préconditions fatales uniquement: connexion impossible ou table
    /// requise absente.
    pub async fn run(&self) -> Result<ImportReport> {
        let started = Instant::now();

        store::test_connection(&self.pool)
            .await
            .context("Cannot connect to database")?;
        store::check_tables(&self.pool).await?;

        let mut report = ImportReport::new();

        info!("[1/3] Importing admin boundaries");
        self.import_regions(&mut report).await?;
        self.import_departements(&mut report).await?;
        self.import_communes(&mut report).await?;

        info!("[2/3] Importing cadastre parcelles");
        self.import_cadastre(&mut report).await?;

        info!("[3/3] Importing BD Forêt (IGN shapefiles)");
        self.import_bdforet(&mut report).await?;

        for table in store::REQUIRED_TABLES {
            let count = store::table_count(&self.pool, table).await?;
            report.record_table_count(table, count);
        }

        report.set_duration(started.elapsed());
        Ok(report)
    }

    /// Lit un document admin et enregistre l'issue si la source est
    /// inutilisable
    fn read_admin_source(
        &self,
        report: &mut ImportReport,
        label: &str,
        path: &Path,
    ) -> Option<Vec<Feature>> {
        if !path.exists() {
            warn!(source = label, path = %path.display(), "Source file not found");
            report.record_skipped_missing(label);
            return None;
        }

        match read_feature_collection(path) {
            Ok(features) if features.is_empty() => {
                report.record_skipped_empty(label);
                None
            }
            Ok(features) => Some(features),
            Err(SourceError::NotAFeatureCollection { .. }) => {
                warn!(
                    source = label,
                    "File has no features (re-run the download script)"
                );
                report.record_skipped_empty(label);
                None
            }
            Err(e) => {
                warn!(source = label, error = %e, "Unreadable source document");
                report.record_failed(label, e.to_string());
                None
            }
        }
    }

    async fn import_regions(&self, report: &mut ImportReport) -> Result<()> {
        let path = self.config.data_dir.join("admin").join("regions.geojson");
        let Some(features) = self.read_admin_source(report, "regions", &path) else {
            return Ok(());
        };
        info!(count = features.len(), "regions: features read");

        store::truncate_table(&self.pool, "regions", true).await?;

        let mut loader = BatchLoader::<RegionRow>::new(&self.pool, self.config.batch_size);
        for feature in &features {
            if let Some(row) = RegionRow::from_feature(feature) {
                loader.push(row).await?;
            }
        }
        let stats = loader.finish().await?;
        report.record_completed("regions", stats);
        Ok(())
    }

    async fn import_departements(&self, report: &mut ImportReport) -> Result<()> {
        let path = self
            .config
            .data_dir
            .join("admin")
            .join("departements.geojson");
        let Some(features) = self.read_admin_source(report, "departements", &path) else {
            return Ok(());
        };
        info!(count = features.len(), "departements: features read");

        store::truncate_table(&self.pool, "departements", true).await?;

        let mut loader = BatchLoader::<DepartementRow>::new(&self.pool, self.config.batch_size);
        for feature in &features {
            if let Some(row) = DepartementRow::from_feature(feature) {
                loader.push(row).await?;
            }
        }
        let stats = loader.finish().await?;

        // Passe corrective unique: region_code manquant rempli par
        // contenance du centroïde
        repair::resolve_missing_parents(&self.pool, &repair::DEPARTEMENT_REGION).await?;

        report.record_completed("departements", stats);
        Ok(())
    }

    async fn import_communes(&self, report: &mut ImportReport) -> Result<()> {
        let mut pending: Vec<CommuneRow> = Vec::new();

        for dept in &self.config.departments {
            let path = self
                .config
                .data_dir
                .join("admin")
                .join("communes")
                .join(format!("{}-communes.geojson", dept));

            if !path.exists() {
                info!(departement = %dept, "communes: file not found, skipping");
                continue;
            }

            match read_feature_collection(&path) {
                Ok(features) => {
                    let before = pending.len();
                    pending.extend(
                        features
                            .iter()
                            .filter_map(|f| CommuneRow::from_feature(f, dept)),
                    );
                    info!(
                        departement = %dept,
                        queued = pending.len() - before,
                        "communes queued"
                    );
                }
                Err(e) => {
                    warn!(departement = %dept, error = %e, "Unreadable communes file");
                }
            }
        }

        if pending.is_empty() {
            warn!("No commune files found");
            report.record_skipped_missing("communes");
            return Ok(());
        }

        store::truncate_table(&self.pool, "communes", true).await?;

        let mut loader = BatchLoader::<CommuneRow>::new(&self.pool, self.config.batch_size);
        for row in pending {
            loader.push(row).await?;
        }
        let stats = loader.finish().await?;
        report.record_completed("communes", stats);
        Ok(())
    }

    async fn import_cadastre(&self, report: &mut ImportReport) -> Result<()> {
        store::truncate_table(&self.pool, "cadastre_parcelles", false).await?;

        // Un seul chargeur courant pour toute l'étape cadastre
        let mut loader = BatchLoader::<ParcelleRow>::new(&self.pool, self.config.batch_size);

        for dept in &self.config.departments {
            let label = format!("cadastre/{}", dept);
            let dir = self.config.data_dir.join("cadastre").join(dept);

            if !dir.is_dir() {
                warn!(departement = %dept, "cadastre: directory not found");
                report.record_skipped_missing(&label);
                continue;
            }

            let files = commune_parcel_files(&dir)?;
            if files.is_empty() {
                warn!(departement = %dept, "cadastre: no parcelles.geojson files found");
                report.record_skipped_empty(&label);
                continue;
            }

            info!(departement = %dept, files = files.len(), "cadastre: loading commune files");
            let before = loader.stats();

            for file in &files {
                match read_feature_collection(file) {
                    Ok(features) => {
                        for feature in &features {
                            if let Some(row) = ParcelleRow::from_feature(feature, dept) {
                                loader.push(row).await?;
                            }
                        }
                    }
                    Err(e) => {
                        // Document malformé en cours d'accumulation:
                        // compté côté échecs, le chargement continue
                        warn!(file = %file.display(), error = %e, "Unreadable cadastre file");
                        loader.record_failed(1);
                    }
                }
            }

            loader.flush().await?;
            report.record_completed(&label, loader.stats().delta_since(&before));
        }

        let total = loader.finish().await?;
        info!(
            accepted = total.accepted,
            failed = total.failed,
            "Cadastre stage complete"
        );
        Ok(())
    }

    async fn import_bdforet(&self, report: &mut ImportReport) -> Result<()> {
        store::truncate_table(&self.pool, "forest_parcels", false).await?;

        let converter = ShapefileConverter::new(self.ogr_dsn.clone());

        for dept in &self.config.departments {
            let label = format!("bdforet/{}", dept);
            let src_dir = self.config.data_dir.join("bdforet").join(dept);
            let src_shp = src_dir.join(format!("{}.shp", BUNDLE_BASENAME));

            if !src_shp.exists() {
                warn!(departement = %dept, path = %src_shp.display(), "bdforet: shapefile not found");
                report.record_skipped_missing(&label);
                continue;
            }

            info!(departement = %dept, "bdforet: converting");
            match converter.convert_department(&src_dir, dept).await? {
                ConversionOutcome::Completed => {
                    // L'outil fait sa propre écriture en masse; les
                    // comptes viennent du résumé final par table
                    report.record_completed(&label, LoadStats::default());
                }
                ConversionOutcome::Failed { diagnostic } => {
                    report.record_failed(&label, diagnostic);
                }
            }
        }

        Ok(())
    }
}

/// Liste les fichiers `<commune>/parcelles.geojson` d'un répertoire
/// départemental, triés pour un ordre de run déterministe
fn commune_parcel_files(dept_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dept_dir)
        .with_context(|| format!("Failed to read {}", dept_dir.display()))?
    {
        let entry = entry?;
        let candidate = entry.path().join("parcelles.geojson");
        if entry.path().is_dir() && candidate.is_file() {
            files.push(candidate);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commune_parcel_files() {
        let dir = tempfile::tempdir().unwrap();

        for commune in ["78646", "78005", "78123"] {
            let sub = dir.path().join(commune);
            std::fs::create_dir(&sub).unwrap();
            std::fs::write(sub.join("parcelles.geojson"), b"{}").unwrap();
        }
        // Sous-répertoire sans fichier parcelles: ignoré
        std::fs::create_dir(dir.path().join("78999")).unwrap();
        // Fichier parasite à la racine: ignoré
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = commune_parcel_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        // Tri déterministe
        assert!(files[0].to_string_lossy().contains("78005"));
        assert!(files[2].to_string_lossy().contains("78646"));
    }

    #[test]
    fn test_commune_parcel_files_missing_dir() {
        assert!(commune_parcel_files(Path::new("/nonexistent/dir")).is_err());
    }
}
