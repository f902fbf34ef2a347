//! Formulaire de pondération : lecture des critères saisis par l'expert

use std::collections::HashMap;

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{AnnotatorError, Result};
use crate::model::WeightSnapshot;

/// Accès à l'état courant du formulaire
///
/// La session appelle `snapshot` au moment du commit, jamais au début du dessin.
pub trait WeightForm {
    fn snapshot(&self) -> WeightSnapshot;
}

/// Formulaire tenu en mémoire (CLI, tests, surfaces sans DOM)
#[derive(Debug, Clone)]
pub struct StaticWeightForm {
    /// Critères dans l'ordre d'affichage
    criteria: Vec<String>,
    values: HashMap<String, String>,
    /// Onglets (spécialité -> critères)
    tabs: Vec<(String, Vec<String>)>,
    active_tab: Option<String>,
}

impl StaticWeightForm {
    pub fn new<I, S>(criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            criteria: criteria.into_iter().map(Into::into).collect(),
            values: HashMap::new(),
            tabs: Vec::new(),
            active_tab: None,
        }
    }

    /// Formulaire construit depuis les onglets configurés, onglet par défaut ouvert
    pub fn from_config(config: &AppConfig) -> Self {
        let mut form = Self::new(config.criteria());
        form.tabs = config
            .tabs
            .iter()
            .map(|t| (t.name.clone(), t.criteria.clone()))
            .collect();
        // Un onglet par défaut absent laisse le formulaire sans onglet actif
        let _ = form.open_tab(&config.default_tab);
        form
    }

    /// Saisit une valeur; les critères hors formulaire sont refusés
    pub fn set(&mut self, criterion: &str, value: impl Into<String>) -> Result<()> {
        if !self.criteria.iter().any(|c| c == criterion) {
            return Err(AnnotatorError::UnknownCriterion(criterion.to_string()));
        }
        self.values.insert(criterion.to_string(), value.into());
        Ok(())
    }

    pub fn clear(&mut self, criterion: &str) {
        self.values.remove(criterion);
    }

    /// Sélectionne l'onglet affiché
    pub fn open_tab(&mut self, name: &str) -> Result<()> {
        if !self.tabs.iter().any(|(tab, _)| tab == name) {
            return Err(AnnotatorError::validation(format!("Unknown tab: {}", name)));
        }
        debug!(tab = name, "Tab opened");
        self.active_tab = Some(name.to_string());
        Ok(())
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    /// Critères de l'onglet actif
    pub fn visible_criteria(&self) -> &[String] {
        self.active_tab
            .as_ref()
            .and_then(|active| self.tabs.iter().find(|(tab, _)| tab == active))
            .map(|(_, criteria)| criteria.as_slice())
            .unwrap_or(&[])
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }
}

impl WeightForm for StaticWeightForm {
    fn snapshot(&self) -> WeightSnapshot {
        self.criteria
            .iter()
            .map(|c| {
                let value = self.values.get(c).cloned().unwrap_or_default();
                (c.clone(), value)
            })
            .collect()
    }
}

impl<F: WeightForm + ?Sized> WeightForm for &F {
    fn snapshot(&self) -> WeightSnapshot {
        (**self).snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_lists_every_criterion() {
        let mut form = StaticWeightForm::new(["salinity", "slope"]);
        form.set("salinity", "4").unwrap();

        let snapshot = form.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("salinity"), Some("4"));
        assert_eq!(snapshot.missing(), vec!["slope"]);
    }

    #[test]
    fn test_unknown_criterion() {
        let mut form = StaticWeightForm::new(["salinity"]);
        assert!(matches!(
            form.set("altitude", "1"),
            Err(AnnotatorError::UnknownCriterion(_))
        ));
    }

    #[test]
    fn test_snapshot_is_a_value() {
        let mut form = StaticWeightForm::new(["salinity"]);
        form.set("salinity", "1").unwrap();
        let before = form.snapshot();
        form.set("salinity", "2").unwrap();
        assert_eq!(before.get("salinity"), Some("1"));
        assert_eq!(form.snapshot().get("salinity"), Some("2"));
    }

    #[test]
    fn test_tabs_from_config() {
        let config = AppConfig::from_preset("default").unwrap();
        let mut form = StaticWeightForm::from_config(&config);
        assert_eq!(form.active_tab(), Some("soil"));
        assert!(form.visible_criteria().iter().any(|c| c == "salinity"));

        form.open_tab("water").unwrap();
        assert!(form.visible_criteria().iter().any(|c| c == "flood_risk"));
        assert!(form.open_tab("astronomy").is_err());
        assert_eq!(form.active_tab(), Some("water"));
    }
}
