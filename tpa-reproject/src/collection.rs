//! Reprojection de FeatureCollection GeoJSON
//!
//! Seules les géométries MultiPolygon sont reprojetées (limites des TPA);
//! tout autre type de géométrie est laissé tel quel.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use tracing::debug;

use crate::error::Result;
use crate::reproject::Reprojector;

/// Reprojette la collection et la retourne (même valeur, modifiée sur place)
pub fn reproject_feature_collection(
    mut collection: FeatureCollection,
    reprojector: &Reprojector,
) -> Result<FeatureCollection> {
    reproject_feature_collection_in_place(&mut collection, reprojector)?;
    Ok(collection)
}

/// Reprojette la collection sur place; retourne le nombre de features MultiPolygon réécrites
///
/// En cas d'erreur, les features déjà traitées restent reprojetées.
pub fn reproject_feature_collection_in_place(
    collection: &mut FeatureCollection,
    reprojector: &Reprojector,
) -> Result<usize> {
    let mut rewritten = 0;
    for feature in &mut collection.features {
        if reproject_feature(feature, reprojector)? {
            rewritten += 1;
        }
    }

    debug!(
        features = collection.features.len(),
        rewritten,
        source = reprojector.source(),
        target = reprojector.target(),
        "FeatureCollection reprojected"
    );
    Ok(rewritten)
}

/// Reprojette une feature si sa géométrie est un MultiPolygon
pub fn reproject_feature(feature: &mut Feature, reprojector: &Reprojector) -> Result<bool> {
    match feature.geometry.as_mut() {
        Some(geometry) => reproject_multipolygon(geometry, reprojector),
        None => Ok(false),
    }
}

fn reproject_multipolygon(geometry: &mut Geometry, reprojector: &Reprojector) -> Result<bool> {
    let Value::MultiPolygon(polygons) = &geometry.value else {
        return Ok(false);
    };

    // Polygones -> anneaux -> positions, imbrication conservée
    let reprojected = polygons
        .iter()
        .map(|polygon| {
            polygon
                .iter()
                .map(|ring| reprojector.reproject_coordinate_sequence(ring))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    geometry.value = Value::MultiPolygon(reprojected);
    // Une bbox éventuelle est exprimée dans l'ancien CRS
    geometry.bbox = None;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CrsRegistry, UTM_39N, WGS84};
    use geojson::JsonObject;
    use serde_json::json;

    fn tpa_feature(code: &str) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("TPA_Code".into(), json!(code));
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::MultiPolygon(vec![vec![vec![
                vec![6000.0, 3155000.0],
                vec![7000.0, 3155000.0],
                vec![7000.0, 3156000.0],
                vec![6000.0, 3156000.0],
                vec![6000.0, 3155000.0],
            ]]]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    fn point_feature() -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![6500.0, 3155500.0]))),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn reprojector() -> Reprojector {
        Reprojector::new(&CrsRegistry::with_defaults(), UTM_39N, WGS84).unwrap()
    }

    #[test]
    fn test_multipolygon_reprojected() {
        let fc = reproject_feature_collection(collection(vec![tpa_feature("A1")]), &reprojector())
            .unwrap();

        let Some(Geometry {
            value: Value::MultiPolygon(polygons),
            ..
        }) = &fc.features[0].geometry
        else {
            panic!("Expected MultiPolygon geometry");
        };
        let ring = &polygons[0][0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert!(ring[0][0] > 45.0 && ring[0][0] < 47.0, "lon={}", ring[0][0]);
        assert!(ring[0][1] > 28.0 && ring[0][1] < 29.0, "lat={}", ring[0][1]);
    }

    #[test]
    fn test_properties_and_count_preserved() {
        let input = collection(vec![tpa_feature("A1"), point_feature(), tpa_feature("B2")]);
        let properties: Vec<_> = input.features.iter().map(|f| f.properties.clone()).collect();

        let mut fc = input;
        let rewritten = reproject_feature_collection_in_place(&mut fc, &reprojector()).unwrap();

        assert_eq!(rewritten, 2);
        assert_eq!(fc.features.len(), 3);
        let after: Vec<_> = fc.features.iter().map(|f| f.properties.clone()).collect();
        assert_eq!(properties, after);
    }

    #[test]
    fn test_other_geometries_untouched() {
        let original = point_feature();
        let fc = reproject_feature_collection(collection(vec![original.clone()]), &reprojector())
            .unwrap();
        assert_eq!(fc.features[0], original);
    }

    #[test]
    fn test_empty_collection() {
        let fc = reproject_feature_collection(collection(vec![]), &reprojector()).unwrap();
        assert!(fc.features.is_empty());
    }

    #[test]
    fn test_invalid_position_propagates() {
        let mut feature = tpa_feature("bad");
        if let Some(geometry) = feature.geometry.as_mut() {
            geometry.value = Value::MultiPolygon(vec![vec![vec![vec![1.0]]]]);
        }
        assert!(reproject_feature_collection(collection(vec![feature]), &reprojector()).is_err());
    }
}
