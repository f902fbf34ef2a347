//! Configuration de l'outil d'annotation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tpa_reproject::CrsRegistry;
use tracing::debug;

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Fichier GeoJSON des TPA (en CRS source)
    #[serde(default = "default_tpa_path")]
    pub tpa_path: PathBuf,

    /// CRS des TPA
    #[serde(default = "default_source_crs")]
    pub source_crs: String,

    /// CRS d'affichage (et des fichiers importés/exportés)
    #[serde(default = "default_target_crs")]
    pub target_crs: String,

    /// Définitions PROJ.4 supplémentaires (identifiant -> définition)
    #[serde(default)]
    pub crs_definitions: BTreeMap<String, String>,

    /// Onglet ouvert au démarrage
    #[serde(default = "default_tab")]
    pub default_tab: String,

    /// Onglets du formulaire de pondération
    pub tabs: Vec<CriteriaTab>,
}

/// Onglet du formulaire (une spécialité) et ses critères
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CriteriaTab {
    pub name: String,
    pub criteria: Vec<String>,
}

fn default_tpa_path() -> PathBuf {
    PathBuf::from("data/tpas.geojson")
}

fn default_source_crs() -> String {
    tpa_reproject::UTM_39N.to_string()
}

fn default_target_crs() -> String {
    tpa_reproject::WGS84.to_string()
}

fn default_tab() -> String {
    "soil".to_string()
}

impl AppConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "soil" => Self::load_embedded(include_str!("presets/soil.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, soil", preset),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn from_spec(spec: &str) -> Result<Self> {
        let path = Path::new(spec);
        if path.extension().is_some_and(|ext| ext == "json") || path.exists() {
            Self::load(path)
        } else {
            Self::from_preset(spec)
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Surcharges par variables d'environnement (TPA_PATH, TPA_SOURCE_CRS, TPA_TARGET_CRS)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("TPA_PATH") {
            debug!(path = %path, "TPA_PATH override");
            self.tpa_path = PathBuf::from(path);
        }
        if let Ok(crs) = std::env::var("TPA_SOURCE_CRS") {
            self.source_crs = crs;
        }
        if let Ok(crs) = std::env::var("TPA_TARGET_CRS") {
            self.target_crs = crs;
        }
        self
    }

    /// Récupère un onglet par nom
    pub fn tab(&self, name: &str) -> Option<&CriteriaTab> {
        self.tabs.iter().find(|t| t.name == name)
    }

    /// Tous les critères, dans l'ordre des onglets
    pub fn criteria(&self) -> impl Iterator<Item = &str> {
        self.tabs
            .iter()
            .flat_map(|t| t.criteria.iter().map(String::as_str))
    }

    /// Registre par défaut (UTM 39N, WGS84) complété des définitions configurées
    pub fn registry(&self) -> Result<CrsRegistry> {
        let mut registry = CrsRegistry::with_defaults();
        for (identifier, definition) in &self.crs_definitions {
            registry
                .register(identifier, definition)
                .context(format!("Invalid CRS definition for {}", identifier))?;
        }
        Ok(registry)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tpa_path: default_tpa_path(),
            source_crs: default_source_crs(),
            target_crs: default_target_crs(),
            crs_definitions: BTreeMap::new(),
            default_tab: default_tab(),
            tabs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_parse() {
        let config = AppConfig::from_preset("default").unwrap();
        assert_eq!(config.default_tab, "soil");
        assert!(config.tab("soil").is_some());
        assert!(config.criteria().count() >= 10);

        let soil = AppConfig::from_preset("soil").unwrap();
        assert_eq!(soil.tabs.len(), 1);
        assert!(AppConfig::from_preset("unknown").is_err());
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{"tabs":[{"name":"soil","criteria":["salinity"]}]}"#).unwrap();
        assert_eq!(config.source_crs, "EPSG:32639");
        assert_eq!(config.target_crs, "EPSG:4326");
        assert_eq!(config.tpa_path, PathBuf::from("data/tpas.geojson"));
    }

    #[test]
    fn test_registry_with_extra_definitions() {
        let mut config = AppConfig::from_preset("default").unwrap();
        config.crs_definitions.insert(
            "EPSG:32638".into(),
            "+proj=utm +zone=38 +datum=WGS84".into(),
        );
        let registry = config.registry().unwrap();
        assert!(registry.contains("EPSG:32638"));
        assert!(registry.contains("EPSG:32639"));

        config
            .crs_definitions
            .insert("bad".into(), "no projection here".into());
        assert!(config.registry().is_err());
    }
}
