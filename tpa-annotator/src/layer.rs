//! Couches à afficher par la surface cartographique (style, popup, emprise)

use geo::{BoundingRect, Coord, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonValue};
use serde::Serialize;
use tracing::warn;

use crate::model::{AnnotationCollection, AUTHOR_NAME, AUTHOR_SPECIALTY};

/// Propriété portant l'identifiant d'une TPA
pub const TPA_CODE: &str = "TPA_Code";

/// Clés écrites par les anciennes versions de l'outil
const LEGACY_AUTHOR_NAME: &str = "expertName";
const LEGACY_AUTHOR_SPECIALTY: &str = "expertSpecialty";

/// Style de rendu d'une couche
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerStyle {
    pub color: &'static str,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl LayerStyle {
    /// Limites des TPA, remplissage quasi transparent
    pub const TPA: LayerStyle = LayerStyle {
        color: "blue",
        weight: 2.0,
        fill_opacity: 0.05,
    };

    /// Annotations importées
    pub const IMPORTED: LayerStyle = LayerStyle {
        color: "red",
        weight: 2.0,
        fill_opacity: 0.1,
    };

    /// Formes dessinées pendant la session
    pub const DRAWN: LayerStyle = LayerStyle {
        color: "#ff0000",
        weight: 3.0,
        fill_opacity: 0.2,
    };
}

/// Feature prête à être rendue
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    pub feature: Feature,
    pub popup: Option<String>,
    pub style: LayerStyle,
}

/// Forme produite par l'outil de dessin (coordonnées géographiques)
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnShape {
    Rectangle(Rect<f64>),
    Polygon(geo::Polygon<f64>),
}

impl DrawnShape {
    /// Rectangle à partir de deux coins opposés
    pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self::Rectangle(Rect::new(
            Coord { x: min_lon, y: min_lat },
            Coord { x: max_lon, y: max_lat },
        ))
    }

    /// Polygone à partir des sommets (l'anneau est fermé automatiquement)
    pub fn polygon(vertices: Vec<(f64, f64)>) -> Self {
        Self::Polygon(geo::Polygon::new(vertices.into(), vec![]))
    }

    /// Géométrie GeoJSON (Polygon)
    pub fn to_geometry(&self) -> Geometry {
        let polygon = match self {
            Self::Rectangle(rect) => rect.to_polygon(),
            Self::Polygon(polygon) => polygon.clone(),
        };
        Geometry::new(geojson::Value::from(&polygon))
    }
}

/// Texte d'une valeur de propriété (chaîne ou nombre); vide si absente
fn property_text(feature: &Feature, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match feature.property(key) {
            Some(JsonValue::Null) | None => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_default()
}

/// Code de la TPA ("" si absent)
pub fn tpa_code(feature: &Feature) -> String {
    property_text(feature, &[TPA_CODE])
}

/// Popup d'une TPA
pub fn tpa_popup(feature: &Feature) -> String {
    format!("TPA ID: {}", tpa_code(feature))
}

/// Popup d'une annotation importée
pub fn author_popup(feature: &Feature) -> String {
    format!(
        "Expert: {}<br>Specialty: {}",
        property_text(feature, &[AUTHOR_NAME, LEGACY_AUTHOR_NAME]),
        property_text(feature, &[AUTHOR_SPECIALTY, LEGACY_AUTHOR_SPECIALTY])
    )
}

/// Couches TPA (lecture seule)
pub fn tpa_layers(collection: &FeatureCollection) -> Vec<RenderLayer> {
    collection
        .features
        .iter()
        .map(|feature| {
            if feature.property(TPA_CODE).is_none() {
                warn!("TPA feature without {} property", TPA_CODE);
            }
            RenderLayer {
                feature: feature.clone(),
                popup: Some(tpa_popup(feature)),
                style: LayerStyle::TPA,
            }
        })
        .collect()
}

/// Couches d'annotations importées
pub fn imported_layers(collection: &FeatureCollection) -> Vec<RenderLayer> {
    collection
        .features
        .iter()
        .map(|feature| RenderLayer {
            feature: feature.clone(),
            popup: Some(author_popup(feature)),
            style: LayerStyle::IMPORTED,
        })
        .collect()
}

/// Couches des annotations de la session, éditables
pub fn drawn_layers(annotations: &AnnotationCollection) -> Vec<RenderLayer> {
    annotations
        .iter()
        .map(|annotation| RenderLayer {
            feature: annotation.feature.clone(),
            popup: Some(author_popup(&annotation.feature)),
            style: LayerStyle::DRAWN,
        })
        .collect()
}

/// Emprise englobante des couches (pour cadrer la vue); `None` si rien de mesurable
pub fn layer_bounds(layers: &[RenderLayer]) -> Option<Rect<f64>> {
    layers
        .iter()
        .filter_map(|layer| layer.feature.geometry.as_ref())
        .filter_map(|geometry| geo::Geometry::<f64>::try_from(geometry.value.clone()).ok())
        .filter_map(|geometry| geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
}
