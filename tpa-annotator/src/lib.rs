//! # tpa-annotator
//!
//! Annotation des TPA (target polygon areas) par des experts : polygones
//! dessinés, pondérés par critère, puis exportés en GeoJSON.
//!
//! ## Features
//!
//! - Chargement asynchrone des TPA (UTM 39N) reprojetées en WGS84
//! - Formulaire de pondération par onglets (spécialités)
//! - Validation identité + pondérations au commit
//! - Export `{authorName}_{authorSpecialty}.geojson`, import sans reprojection
//!
//! ## Usage CLI
//!
//! ```bash
//! # Reprojeter un fichier de TPA
//! tpa-annotator reproject --input data/tpas.geojson --output tpas_wgs84.geojson
//!
//! # Session d'annotation
//! tpa-annotator annotate --name Jane --specialty soil \
//!     --weight soil_texture=3 --weight soil_depth=2 --weight salinity=1 \
//!     --rect 45.9,28.4,46.0,28.5 --output ./out --config soil
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod import;
pub mod layer;
pub mod model;
pub mod report;
pub mod session;
pub mod tpa;

pub use config::{AppConfig, CriteriaTab};
pub use error::{AnnotatorError, Result};
pub use export::{export_geojson, write_export, GeoJsonExport};
pub use form::{StaticWeightForm, WeightForm};
pub use import::{import_geojson, ImportedLayer};
pub use layer::{DrawnShape, LayerStyle, RenderLayer};
pub use model::{Annotation, AnnotationCollection, AnnotationId, Identity, WeightSnapshot};
pub use report::{SessionReport, SessionStage, SessionStatus};
pub use session::{DrawEvent, DrawState, LogNotifier, Notifier, Session};
pub use tpa::{load_tpa_collection, spawn_tpa_load, TpaLoadResult};
