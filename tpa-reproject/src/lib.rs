//! # tpa-reproject
//!
//! Reprojection des limites de TPA (target polygon areas) saisies en UTM
//! zone 39N vers le WGS84 géographique utilisé par le fond de carte.
//!
//! ## Features
//!
//! - Registre de CRS nommés, définitions au format PROJ.4
//! - UTM ↔ géographique en Rust pur (séries de Krüger, WGS84)
//! - Fallback sur PROJ pour les autres définitions (feature `proj`)
//! - Reprojection des FeatureCollection GeoJSON (MultiPolygon uniquement)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tpa_reproject::{reproject_feature_collection, CrsRegistry, Reprojector, UTM_39N, WGS84};
//!
//! let registry = CrsRegistry::with_defaults();
//! let reprojector = Reprojector::new(&registry, UTM_39N, WGS84)?;
//! let tpas = reproject_feature_collection(tpas, &reprojector)?;
//! ```

pub mod collection;
pub mod crs;
pub mod ellipsoid;
pub mod error;
pub mod registry;
pub mod reproject;
pub mod utm;

#[cfg(feature = "proj")]
pub mod proj_backend;

pub use collection::{
    reproject_feature, reproject_feature_collection, reproject_feature_collection_in_place,
};
pub use crs::{CrsDefinition, Geographic, Projection};
pub use error::ReprojectError;
pub use registry::{CrsRegistry, UTM_39N, WGS84};
pub use reproject::Reprojector;
pub use utm::UtmZone;
