//! Configuration du pipeline d'import

use std::path::PathBuf;

/// Configuration d'un run d'import.
///
/// Valeur explicite passée au constructeur du pipeline, pas d'état
/// global de process.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Racine des données brutes (admin/, cadastre/, bdforet/)
    pub data_dir: PathBuf,

    /// Codes des départements à traiter
    pub departments: Vec<String>,

    /// Capacité d'un batch d'insertion (unité d'atomicité)
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/app/data/raw"),
            departments: vec!["78".into(), "91".into(), "95".into()],
            batch_size: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.departments, vec!["78", "91", "95"]);
    }
}
