//! Invocation de l'outil de conversion externe (ogr2ogr) pour la couche
//! végétation
//!
//! Le bundle shapefile est d'abord copié dans un répertoire temporaire
//! privé: le montage source peut exposer des attributs étendus qui font
//! échouer les lectures de GDAL alors que les lectures ordinaires
//! passent. L'étape de staging est un assainissement requis, pas une
//! optimisation. Le répertoire temporaire est supprimé sur tous les
//! chemins de sortie (RAII via `tempfile::TempDir`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::process::Command;
use tracing::{info, warn};

use bdsource::schema;

/// Nom de base commun aux membres du bundle
pub const BUNDLE_BASENAME: &str = "FORMATION_VEGETALE";

/// Membres du bundle: géométrie + attributs/index/projection/encodage
pub const BUNDLE_EXTENSIONS: &[&str] = &["shp", "dbf", "shx", "prj", "cpg"];

/// Taille maximale du diagnostic capturé sur échec de l'outil
const DIAGNOSTIC_MAX: usize = 500;

/// Issue d'une conversion par département
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// L'outil a terminé avec un statut zéro
    Completed,
    /// Statut non-zéro ou outil inaccessible; diagnostic tronqué
    Failed { diagnostic: String },
}

/// Descripteur structuré d'une invocation ogr2ogr
#[derive(Debug, Clone)]
pub struct OgrInvocation {
    /// Datasource cible (`PG:host=... dbname=...`)
    pub dsn: String,
    /// Shapefile stagé en local
    pub source: PathBuf,
    /// Table de sortie
    pub table: String,
    /// Requête de projection sur l'unique couche de la source
    pub sql: String,
}

impl OgrInvocation {
    /// Arguments de la ligne de commande ogr2ogr
    fn args(&self) -> Vec<String> {
        vec![
            "-f".into(),
            "PostgreSQL".into(),
            self.dsn.clone(),
            self.source.display().to_string(),
            "-nln".into(),
            self.table.clone(),
            "-nlt".into(),
            "PROMOTE_TO_MULTI".into(),
            "-lco".into(),
            "GEOMETRY_NAME=geom".into(),
            "-append".into(),
            "-t_srs".into(),
            "EPSG:4326".into(),
            "-sql".into(),
            self.sql.clone(),
        ]
    }
}

/// Convertisseur shapefile → table PostGIS via ogr2ogr
pub struct ShapefileConverter {
    dsn: String,
}

impl ShapefileConverter {
    pub fn new(dsn: String) -> Self {
        Self { dsn }
    }

    /// Convertit le bundle d'un département vers `forest_parcels`.
    ///
    /// Stage le bundle, introspecte ses champs, résout la projection
    /// canonique, puis invoque l'outil une fois en mode append. Un échec
    /// est une issue par département, pas une erreur du run.
    ///
    /// # Errors
    ///
    /// Seules les erreurs de staging local (I/O sur le répertoire
    /// temporaire) remontent; les échecs de l'outil sont des
    /// `ConversionOutcome::Failed`.
    pub async fn convert_department(
        &self,
        src_dir: &Path,
        departement: &str,
    ) -> Result<ConversionOutcome> {
        // Supprimé au drop, y compris sur échec
        let staging = tempfile::Builder::new()
            .prefix(&format!("bdforet_{}_", departement))
            .tempdir()
            .context("Failed to create staging directory")?;

        let staged_shp = stage_bundle(src_dir, staging.path())?;

        let fields = match shapefile_fields(&staged_shp).await {
            Ok(fields) => fields,
            Err(e) => {
                return Ok(ConversionOutcome::Failed {
                    diagnostic: truncate_diagnostic(&e.to_string(), DIAGNOSTIC_MAX),
                });
            }
        };

        let mapping = schema::resolve(schema::FOREST_FIELDS, &fields);
        let sql = schema::forest_select(&mapping, departement);
        info!(departement = departement, sql = %sql, "Schema resolved");

        let invocation = OgrInvocation {
            dsn: self.dsn.clone(),
            source: staged_shp,
            table: "forest_parcels".into(),
            sql,
        };

        let output = match Command::new("ogr2ogr")
            .args(invocation.args())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return Ok(ConversionOutcome::Failed {
                    diagnostic: truncate_diagnostic(
                        &format!("Failed to run ogr2ogr: {}", e),
                        DIAGNOSTIC_MAX,
                    ),
                });
            }
        };

        if output.status.success() {
            info!(departement = departement, "Conversion complete");
            Ok(ConversionOutcome::Completed)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(departement = departement, "ogr2ogr failed");
            Ok(ConversionOutcome::Failed {
                diagnostic: truncate_diagnostic(&stderr, DIAGNOSTIC_MAX),
            })
        }
    }
}

/// Copie les membres présents du bundle vers le répertoire de staging
/// et retourne le chemin du .shp stagé.
///
/// Le .shp est obligatoire; les membres compagnons absents sont ignorés.
fn stage_bundle(src_dir: &Path, staging: &Path) -> Result<PathBuf> {
    for ext in BUNDLE_EXTENSIONS {
        let member = src_dir.join(format!("{}.{}", BUNDLE_BASENAME, ext));
        if member.exists() {
            std::fs::copy(&member, staging.join(format!("{}.{}", BUNDLE_BASENAME, ext)))
                .with_context(|| format!("Failed to stage {}", member.display()))?;
        }
    }

    let staged_shp = staging.join(format!("{}.shp", BUNDLE_BASENAME));
    if !staged_shp.exists() {
        anyhow::bail!("Bundle has no .shp member in {}", src_dir.display());
    }
    Ok(staged_shp)
}

/// Introspecte les noms de champs de l'unique couche du shapefile
/// (`ogrinfo -al -so`)
async fn shapefile_fields(shp: &Path) -> Result<HashSet<String>> {
    let output = Command::new("ogrinfo")
        .arg("-al")
        .arg("-so")
        .arg(shp)
        .output()
        .await
        .context("Failed to run ogrinfo")?;

    if !output.status.success() {
        anyhow::bail!(
            "ogrinfo failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(parse_ogrinfo_fields(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

fn field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^([A-Z_][A-Z0-9_]*):").expect("static regex"))
}

/// Extrait les noms de champs du résumé ogrinfo (lignes `CHAMP: Type (...)`)
fn parse_ogrinfo_fields(stdout: &str) -> HashSet<String> {
    field_regex()
        .captures_iter(stdout)
        .map(|c| c[1].to_string())
        .collect()
}

/// Tronque un diagnostic à `max` caractères (frontières UTF-8 sûres)
fn truncate_diagnostic(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ogrinfo_fields() {
        let stdout = "\
INFO: Open of `FORMATION_VEGETALE.shp'
Layer name: FORMATION_VEGETALE
Geometry: Polygon
Feature Count: 1234
Extent: (1.446, 48.280) - (2.235, 49.086)
Layer SRS WKT:
PROJCS[\"RGF93 / Lambert-93\"]
CODE_TFV: String (6.0)
LIB_TFV: String (80.0)
ESSENCE1: String (50.0)
ESSENCE2: String (50.0)
CODE_COM: String (5.0)
";
        let fields = parse_ogrinfo_fields(stdout);
        assert_eq!(fields.len(), 5);
        assert!(fields.contains("CODE_TFV"));
        assert!(fields.contains("LIB_TFV"));
        assert!(fields.contains("CODE_COM"));
        // Les lignes d'en-tête ne sont pas des champs
        assert!(!fields.contains("INFO"));
        assert!(!fields.contains("Layer"));
    }

    #[test]
    fn test_parse_ogrinfo_fields_empty() {
        assert!(parse_ogrinfo_fields("no fields here").is_empty());
    }

    #[test]
    fn test_invocation_args() {
        let invocation = OgrInvocation {
            dsn: "PG:host=db dbname=forest_bd".into(),
            source: PathBuf::from("/tmp/x/FORMATION_VEGETALE.shp"),
            table: "forest_parcels".into(),
            sql: "SELECT '' AS code_tfv FROM FORMATION_VEGETALE".into(),
        };
        let args = invocation.args();

        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "PostgreSQL");
        assert_eq!(args[2], "PG:host=db dbname=forest_bd");
        assert!(args.contains(&"-append".to_string()));
        assert!(args.contains(&"PROMOTE_TO_MULTI".to_string()));
        assert!(args.contains(&"EPSG:4326".to_string()));
        assert!(args.contains(&"GEOMETRY_NAME=geom".to_string()));
        // -sql est le dernier couple
        assert_eq!(args[args.len() - 2], "-sql");
    }

    #[test]
    fn test_truncate_diagnostic() {
        assert_eq!(truncate_diagnostic("court", 500), "court");
        let long = "x".repeat(600);
        assert_eq!(truncate_diagnostic(&long, 500).len(), 500);
    }

    #[test]
    fn test_stage_bundle_copies_members() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        for ext in ["shp", "dbf", "prj"] {
            std::fs::write(
                src.path().join(format!("{}.{}", BUNDLE_BASENAME, ext)),
                b"data",
            )
            .unwrap();
        }

        let staged = stage_bundle(src.path(), dst.path()).unwrap();
        assert!(staged.ends_with("FORMATION_VEGETALE.shp"));
        assert!(dst.path().join("FORMATION_VEGETALE.dbf").exists());
        assert!(dst.path().join("FORMATION_VEGETALE.prj").exists());
        // Membre absent de la source: pas d'erreur, pas de copie
        assert!(!dst.path().join("FORMATION_VEGETALE.cpg").exists());
    }

    #[test]
    fn test_stage_bundle_requires_shp() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("FORMATION_VEGETALE.dbf"), b"data").unwrap();

        assert!(stage_bundle(src.path(), dst.path()).is_err());
    }
}
