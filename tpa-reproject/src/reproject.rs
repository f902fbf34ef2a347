//! Reprojection intelligente : backend natif en priorité, fallback sur PROJ
//!
//! Utilise automatiquement la meilleure option disponible pour un couple de CRS
//! du registre.

use geojson::Position;

use crate::crs::{CrsDefinition, Geographic, Projection};
use crate::error::{ReprojectError, Result};
use crate::registry::CrsRegistry;
use crate::utm;

/// Backend retenu pour un couple source/cible
#[derive(Debug)]
enum Backend {
    /// Pas de reprojection (source == cible)
    Identity,
    /// Reprojection native (pure Rust)
    Lite { source: Projection, target: Projection },
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "proj")]
    Proj(crate::proj_backend::ProjTransform),
}

/// Transformation point à point entre deux CRS enregistrés
#[derive(Debug)]
pub struct Reprojector {
    source: String,
    target: String,
    backend: Backend,
}

impl Reprojector {
    /// Crée un reprojector; les deux identifiants doivent être enregistrés
    pub fn new(registry: &CrsRegistry, source: &str, target: &str) -> Result<Self> {
        let source_crs = registry.get(source)?;
        let target_crs = registry.get(target)?;
        let backend = Self::select_backend(source_crs, target_crs)?;

        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            backend,
        })
    }

    fn select_backend(source: &CrsDefinition, target: &CrsDefinition) -> Result<Backend> {
        // Pas de reprojection nécessaire
        if source.identifier == target.identifier || source.definition == target.definition {
            return Ok(Backend::Identity);
        }

        if source.is_native() && target.is_native() {
            return Ok(Backend::Lite {
                source: source.projection.clone(),
                target: target.projection.clone(),
            });
        }

        #[cfg(feature = "proj")]
        {
            let transform = crate::proj_backend::ProjTransform::new(source, target)?;
            return Ok(Backend::Proj(transform));
        }

        #[cfg(not(feature = "proj"))]
        Err(ReprojectError::unsupported(
            source.identifier.as_str(),
            target.identifier.as_str(),
        ))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match &self.backend {
            Backend::Identity => Ok((x, y)),
            Backend::Lite { source, target } => {
                // Étape 1: Source → Géographique (WGS84), étape 2: Géographique → Cible
                let geo = to_geographic(source, x, y);
                Ok(from_geographic(target, geo))
            }
            #[cfg(feature = "proj")]
            Backend::Proj(transform) => transform.convert(x, y),
        }
    }

    /// Transforme une position GeoJSON; les ordonnées au-delà de x/y sont conservées
    pub fn transform_position(&self, position: &[f64]) -> Result<Position> {
        let [x, y, rest @ ..] = position else {
            return Err(ReprojectError::InvalidPosition(position.len()));
        };
        let (x, y) = self.transform_point(*x, *y)?;

        let mut out = Vec::with_capacity(position.len());
        out.push(x);
        out.push(y);
        out.extend_from_slice(rest);
        Ok(out)
    }

    /// Applique la transformation à chaque position, ordre et longueur préservés
    pub fn reproject_coordinate_sequence(&self, sequence: &[Position]) -> Result<Vec<Position>> {
        sequence
            .iter()
            .map(|position| self.transform_position(position))
            .collect()
    }

    /// Retourne une description du backend utilisé
    pub fn description(&self) -> &'static str {
        match self.backend {
            Backend::Identity => "identity (no reprojection)",
            Backend::Lite { .. } => "native (pure Rust transverse Mercator)",
            #[cfg(feature = "proj")]
            Backend::Proj(_) => "proj (PROJ library)",
        }
    }
}

fn to_geographic(projection: &Projection, x: f64, y: f64) -> Geographic {
    match projection {
        Projection::LongLat => Geographic::from_degrees(x, y),
        Projection::Utm(zone) => utm::utm_to_geographic(x, y, *zone),
        // Exclu par select_backend
        Projection::Other(_) => Geographic::new(f64::NAN, f64::NAN),
    }
}

fn from_geographic(projection: &Projection, geo: Geographic) -> (f64, f64) {
    match projection {
        Projection::LongLat => geo.to_degrees(),
        Projection::Utm(zone) => utm::geographic_to_utm(geo, *zone),
        Projection::Other(_) => (f64::NAN, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{UTM_39N, WGS84};

    fn utm_to_wgs84() -> Reprojector {
        Reprojector::new(&CrsRegistry::with_defaults(), UTM_39N, WGS84).unwrap()
    }

    #[test]
    fn test_identity() {
        let r = Reprojector::new(&CrsRegistry::with_defaults(), WGS84, WGS84).unwrap();
        assert!(matches!(r.backend, Backend::Identity));
        assert_eq!(r.transform_point(45.9, 28.4).unwrap(), (45.9, 28.4));
    }

    #[test]
    fn test_lite() {
        let r = utm_to_wgs84();
        assert!(matches!(r.backend, Backend::Lite { .. }));
        let (lon, lat) = r.transform_point(6457.87, 3155648.06).unwrap();
        assert!((lon - 45.9636).abs() < 1e-5, "lon={}", lon);
        assert!((lat - 28.4342).abs() < 1e-5, "lat={}", lat);
    }

    #[test]
    fn test_unregistered_crs() {
        let registry = CrsRegistry::new();
        assert!(matches!(
            Reprojector::new(&registry, UTM_39N, WGS84),
            Err(ReprojectError::UnknownCrs(_))
        ));
    }

    #[cfg(not(feature = "proj"))]
    #[test]
    fn test_other_projection_without_proj() {
        let mut registry = CrsRegistry::with_defaults();
        registry
            .register("EPSG:2154", "+proj=lcc +lat_1=49 +lat_2=44 +ellps=GRS80")
            .unwrap();
        assert!(matches!(
            Reprojector::new(&registry, "EPSG:2154", WGS84),
            Err(ReprojectError::UnsupportedProjection { .. })
        ));
    }

    #[test]
    fn test_position_keeps_elevation() {
        let r = utm_to_wgs84();
        let out = r.transform_position(&[6457.87, 3155648.06, 120.5]).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], 120.5);
    }

    #[test]
    fn test_invalid_position() {
        let r = utm_to_wgs84();
        assert!(matches!(
            r.transform_position(&[1.0]),
            Err(ReprojectError::InvalidPosition(1))
        ));
    }

    #[test]
    fn test_sequence_preserves_order_and_length() {
        let r = utm_to_wgs84();
        assert!(r.reproject_coordinate_sequence(&[]).unwrap().is_empty());

        let ring = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 0.0],
        ];
        let out = r.reproject_coordinate_sequence(&ring).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.first(), out.last());
        // Easting 0 en zone 39N : ~4.49° à l'ouest du méridien central (51°E)
        assert!((out[0][0] - 46.5113).abs() < 1e-3, "lon={}", out[0][0]);
        assert!(out[0][1].abs() < 1e-6, "lat={}", out[0][1]);
        assert!(out[1][1] > out[0][1]);
    }
}
