//! Définition et implémentation des commandes CLI
//!
//! Une seule commande: `import` (run complet vers PostGIS).

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::config::ImportConfig;
use crate::pipeline::ImportPipeline;
use crate::store::{self, DatabaseConfig};

#[derive(Subcommand)]
pub enum Commands {
    /// Import admin boundaries, cadastre parcelles and BD Forêt into PostGIS
    Import {
        /// Root directory of raw data (admin/, cadastre/, bdforet/)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Departement code to process (repeatable, ex: --dept 78 --dept 91)
        #[arg(long = "dept")]
        depts: Vec<String>,

        /// Rows per insert batch (atomicity unit)
        #[arg(long)]
        batch_size: Option<usize>,

        /// PostgreSQL host (défaut : env POSTGRES_HOST / postgres)
        #[arg(long)]
        host: Option<String>,

        /// PostgreSQL port (défaut : env POSTGRES_PORT / 5432)
        #[arg(long)]
        port: Option<u16>,

        /// PostgreSQL database name (défaut : env POSTGRES_DB / forest_bd)
        #[arg(long)]
        database: Option<String>,

        /// PostgreSQL user (défaut : env POSTGRES_USER / forestviewer)
        #[arg(long)]
        user: Option<String>,

        /// PostgreSQL password (défaut : env POSTGRES_PASSWORD)
        #[arg(long)]
        password: Option<String>,
    },
}

/// Exécute la commande import
#[allow(clippy::too_many_arguments)]
pub async fn cmd_import(
    data_dir: Option<PathBuf>,
    depts: Vec<String>,
    batch_size: Option<usize>,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let mut config = ImportConfig::default();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if !depts.is_empty() {
        config.departments = depts;
    }
    if let Some(size) = batch_size {
        config.batch_size = size;
    }

    let mut db_config = DatabaseConfig::from_env();
    apply_database_overrides(&mut db_config, host, port, database, user, password);

    info!(
        data_dir = %config.data_dir.display(),
        departments = ?config.departments,
        batch_size = config.batch_size,
        "Starting import"
    );
    println!(
        "Database: {}@{}:{}/{}",
        db_config.user, db_config.host, db_config.port, db_config.dbname
    );

    let pool = store::create_pool(&db_config).await?;
    let ogr_dsn = db_config.ogr_dsn();

    let pipeline = ImportPipeline::new(config, pool, ogr_dsn);
    let report = pipeline.run().await?;
    report.display();

    Ok(())
}

fn apply_database_overrides(
    config: &mut DatabaseConfig,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
) {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(database) = database {
        config.dbname = database;
    }
    if let Some(user) = user {
        config.user = user;
    }
    if let Some(password) = password {
        config.password = password;
    }
}
