//! Types d'erreurs pour le crate tpa-annotator

use thiserror::Error;

/// Erreurs du modèle d'annotation et de la session
///
/// Aucune n'est fatale : la carte reste utilisable quelle que soit l'opération en échec.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// Champ d'identité ou de pondération vide (commit ou export refusé)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Fichier importé illisible
    #[error("Invalid GeoJSON import: {0}")]
    ImportParse(String),

    /// Chargement initial des TPA (lecture ou parsing)
    #[error("Failed to load TPA collection from {path}: {reason}")]
    Load { path: String, reason: String },

    /// Annotation inconnue (déjà supprimée)
    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(u64),

    /// Critère absent du formulaire
    #[error("Unknown weighting criterion: {0}")]
    UnknownCriterion(String),

    #[error(transparent)]
    Reproject(#[from] tpa_reproject::ReprojectError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnotatorError {
    /// Crée une erreur de chargement avec contexte
    pub fn load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de validation
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T, E = AnnotatorError> = std::result::Result<T, E>;
