//! Modèle d'annotation : features dessinées par un expert et leurs métadonnées

use std::collections::BTreeMap;
use std::fmt;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AnnotatorError, Result};

/// Clé de propriété : nom de l'expert
pub const AUTHOR_NAME: &str = "authorName";
/// Clé de propriété : spécialité de l'expert
pub const AUTHOR_SPECIALTY: &str = "authorSpecialty";
/// Clé de propriété : pondérations (critère -> valeur)
pub const WEIGHTS: &str = "weights";

/// Identité de l'expert qui annote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub author_name: String,
    pub author_specialty: String,
}

impl Identity {
    pub fn new(author_name: impl Into<String>, author_specialty: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            author_specialty: author_specialty.into(),
        }
    }

    /// Identité nettoyée des espaces; erreur si un des champs est vide
    pub fn validated(&self) -> Result<Identity> {
        let name = self.author_name.trim();
        let specialty = self.author_specialty.trim();
        if name.is_empty() || specialty.is_empty() {
            return Err(AnnotatorError::validation(
                "Please enter your name and select your specialty.",
            ));
        }
        Ok(Identity::new(name, specialty))
    }
}

/// Valeurs du formulaire de pondération lues à un instant donné
///
/// Les valeurs restent des chaînes brutes, comme saisies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightSnapshot(BTreeMap<String, String>);

impl WeightSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, criterion: impl Into<String>, value: impl Into<String>) {
        self.0.insert(criterion.into(), value.into());
    }

    pub fn get(&self, criterion: &str) -> Option<&str> {
        self.0.get(criterion).map(String::as_str)
    }

    /// Critères sans valeur
    pub fn missing(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(criterion, _)| criterion.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WeightSnapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Vérifie identité et pondérations avant un commit
pub fn validate_commit(identity: &Identity, weights: &WeightSnapshot) -> Result<Identity> {
    let identity = identity.validated().map_err(|_| {
        AnnotatorError::validation(
            "Please enter your name, select your specialty, and assign weights to all criteria.",
        )
    })?;
    let missing = weights.missing();
    if !missing.is_empty() {
        return Err(AnnotatorError::validation(format!(
            "Please enter your name, select your specialty, and assign weights to all criteria (missing: {}).",
            missing.join(", ")
        )));
    }
    Ok(identity)
}

/// Attache identité et pondérations aux propriétés de la feature
///
/// Rien n'est modifié si la validation échoue.
pub fn attach_metadata(
    feature: &mut Feature,
    identity: &Identity,
    weights: &WeightSnapshot,
) -> Result<()> {
    let identity = validate_commit(identity, weights)?;

    let properties = feature.properties.get_or_insert_with(JsonObject::new);
    properties.insert(AUTHOR_NAME.into(), JsonValue::String(identity.author_name));
    properties.insert(
        AUTHOR_SPECIALTY.into(),
        JsonValue::String(identity.author_specialty),
    );
    properties.insert(WEIGHTS.into(), weights.to_json());
    Ok(())
}

/// Identifiant d'une annotation dans la session (équivalent de l'id de couche)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Annotation validée
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub feature: Feature,
}

/// Annotations dessinées pendant la session
#[derive(Debug, Clone, Default)]
pub struct AnnotationCollection {
    annotations: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valide et ajoute une géométrie dessinée; la collection est inchangée en cas d'erreur
    pub fn commit(
        &mut self,
        geometry: Geometry,
        identity: &Identity,
        weights: &WeightSnapshot,
    ) -> Result<AnnotationId> {
        let mut feature = Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        };
        attach_metadata(&mut feature, identity, weights)?;

        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.annotations.push(Annotation { id, feature });

        info!(id = %id, total = self.annotations.len(), "Annotation committed");
        Ok(id)
    }

    /// Supprime une annotation (outil de suppression)
    pub fn remove(&mut self, id: AnnotationId) -> Result<Feature> {
        let index = self.position(id)?;
        let removed = self.annotations.remove(index);
        debug!(id = %id, remaining = self.annotations.len(), "Annotation removed");
        Ok(removed.feature)
    }

    /// Remplace la géométrie d'une annotation (outil d'édition); les propriétés sont conservées
    pub fn replace_geometry(&mut self, id: AnnotationId, geometry: Geometry) -> Result<()> {
        let index = self.position(id)?;
        self.annotations[index].feature.geometry = Some(geometry);
        debug!(id = %id, "Annotation geometry edited");
        Ok(())
    }

    fn position(&self, id: AnnotationId) -> Result<usize> {
        self.annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(AnnotatorError::UnknownAnnotation(id.0))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// FeatureCollection des annotations, dans l'ordre de création
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.annotations.iter().map(|a| a.feature.clone()).collect(),
            foreign_members: None,
        }
    }
}
