//! # forest-pg
//!
//! Import des données forestières et cadastrales vers PostGIS.
//!
//! ## Features
//!
//! - Limites administratives (régions, départements, communes) depuis GeoJSON
//! - Parcelles cadastrales par commune avec chargement par lots
//! - BD Forêt (shapefiles IGN) via ogr2ogr, schémas de millésimes variables
//! - Réparation spatiale des références hiérarchiques manquantes
//! - Rechargement idempotent (TRUNCATE par table avant import)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Import complet (config via .env / variables POSTGRES_*)
//! forest-pg import
//!
//! # Départements et répertoire de données explicites
//! forest-pg import --data-dir ./data/raw --dept 78 --dept 91
//! ```

pub mod cli;
pub mod config;
pub mod convert;
pub mod loader;
pub mod pipeline;
pub mod repair;
pub mod report;
pub mod rows;
pub mod store;

pub use config::ImportConfig;
pub use pipeline::ImportPipeline;
pub use report::{ImportReport, OutcomeStatus};
pub use store::{create_pool, DatabaseConfig};
