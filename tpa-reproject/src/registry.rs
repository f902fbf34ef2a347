//! Registre des CRS nommés

use std::collections::HashMap;

use tracing::debug;

use crate::crs::CrsDefinition;
use crate::error::{ReprojectError, Result};

/// Identifiant de l'UTM zone 39N (saisie des TPA)
pub const UTM_39N: &str = "EPSG:32639";

/// Identifiant du WGS84 géographique (affichage)
pub const WGS84: &str = "EPSG:4326";

const UTM_39N_DEFINITION: &str = "+proj=utm +zone=39 +ellps=WGS84 +datum=WGS84 +units=m +no_defs";
const WGS84_DEFINITION: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Registre des définitions, consulté par identifiant lors de la création d'un `Reprojector`
#[derive(Debug, Clone, Default)]
pub struct CrsRegistry {
    definitions: HashMap<String, CrsDefinition>,
}

impl CrsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registre contenant l'UTM 39N et le WGS84
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // Définitions constantes, le parsing ne peut pas échouer
        for (identifier, definition) in [(UTM_39N, UTM_39N_DEFINITION), (WGS84, WGS84_DEFINITION)] {
            if let Ok(crs) = CrsDefinition::parse(identifier, definition) {
                registry.definitions.insert(identifier.to_string(), crs);
            }
        }
        registry
    }

    /// Enregistre (ou remplace) une définition
    pub fn register(&mut self, identifier: &str, definition: &str) -> Result<()> {
        let crs = CrsDefinition::parse(identifier, definition)?;
        if let Some(previous) = self.definitions.insert(identifier.to_string(), crs) {
            debug!(
                identifier,
                previous = %previous.definition,
                "CRS definition overwritten"
            );
        }
        Ok(())
    }

    /// Récupère une définition enregistrée
    pub fn get(&self, identifier: &str) -> Result<&CrsDefinition> {
        self.definitions
            .get(identifier)
            .ok_or_else(|| ReprojectError::UnknownCrs(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.definitions.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
