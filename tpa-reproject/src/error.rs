//! Types d'erreurs pour le crate tpa-reproject

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'enregistrement d'un CRS ou d'une reprojection
#[derive(Debug, Error)]
pub enum ReprojectError {
    /// Identifiant de CRS jamais enregistré
    #[error("Unknown CRS: {0} (register it before reprojecting)")]
    UnknownCrs(String),

    /// Chaîne de définition illisible
    #[error("Invalid CRS definition for {identifier}: {reason}")]
    InvalidDefinition { identifier: String, reason: String },

    /// Aucun backend ne sait transformer ce couple de CRS
    #[error("Unsupported reprojection {source_crs} -> {target_crs}")]
    UnsupportedProjection {
        source_crs: String,
        target_crs: String,
    },

    /// Position GeoJSON avec moins de deux ordonnées
    #[error("Invalid position: expected at least 2 ordinates, got {0}")]
    InvalidPosition(usize),

    /// Erreur remontée par la bibliothèque PROJ
    #[error("PROJ error: {0}")]
    Proj(String),
}

impl ReprojectError {
    /// Crée une erreur de définition invalide avec contexte
    pub fn invalid_definition(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de couple de CRS non supporté
    pub fn unsupported(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnsupportedProjection {
            source_crs: source.into(),
            target_crs: target.into(),
        }
    }
}

/// Alias de résultat pour le crate
pub type Result<T, E = ReprojectError> = std::result::Result<T, E>;
