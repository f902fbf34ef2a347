//! Reprojection via la bibliothèque PROJ
//!
//! Ce module est disponible uniquement avec le feature `proj`.

use proj::Proj;

use crate::crs::CrsDefinition;
use crate::error::{ReprojectError, Result};

/// Transformation PROJ entre deux définitions enregistrées
pub struct ProjTransform {
    proj: Proj,
}

impl std::fmt::Debug for ProjTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjTransform").finish_non_exhaustive()
    }
}

impl ProjTransform {
    /// Crée la transformation depuis les chaînes de définition
    pub fn new(source: &CrsDefinition, target: &CrsDefinition) -> Result<Self> {
        let proj = Proj::new_known_crs(&source.definition, &target.definition, None).map_err(|e| {
            ReprojectError::Proj(format!(
                "failed to create projection from {} to {}: {}",
                source.identifier, target.identifier, e
            ))
        })?;
        Ok(Self { proj })
    }

    /// Transforme une coordonnée unique
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.proj
            .convert((x, y))
            .map_err(|e| ReprojectError::Proj(format!("coordinate transformation failed: {}", e)))
    }
}
