//! Types d'erreurs pour le crate bdsource

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'une source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Erreur d'I/O lors de la lecture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document JSON invalide
    #[error("Invalid JSON in {file}: {reason}")]
    InvalidJson { file: String, reason: String },

    /// Document valide mais qui n'est pas une FeatureCollection
    /// (typiquement un tableau renvoyé par un téléchargement raté)
    #[error("Not a FeatureCollection: {file}")]
    NotAFeatureCollection { file: String },
}

impl SourceError {
    /// Crée une erreur de JSON invalide avec contexte
    pub fn invalid_json(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidJson {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
