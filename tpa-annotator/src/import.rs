//! Import d'un fichier GeoJSON d'annotations (déjà en coordonnées géographiques)

use geojson::{Feature, FeatureCollection, GeoJson};
use tracing::info;

use crate::error::{AnnotatorError, Result};
use crate::layer::{imported_layers, RenderLayer};

/// Contenu importé et couches correspondantes
#[derive(Debug, Clone)]
pub struct ImportedLayer {
    pub collection: FeatureCollection,
    pub layers: Vec<RenderLayer>,
}

impl ImportedLayer {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Parse un document GeoJSON; pas de reprojection
///
/// Comme la couche GeoJSON de la carte, accepte une FeatureCollection, une Feature
/// seule ou une géométrie nue.
pub fn import_geojson(raw: &str) -> Result<ImportedLayer> {
    let geojson: GeoJson = raw
        .parse()
        .map_err(|e: geojson::Error| AnnotatorError::ImportParse(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => single(feature),
        GeoJson::Geometry(geometry) => single(Feature::from(geometry)),
    };

    let layers = imported_layers(&collection);
    info!(features = layers.len(), "GeoJSON imported");

    Ok(ImportedLayer { collection, layers })
}

fn single(feature: Feature) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }
}
