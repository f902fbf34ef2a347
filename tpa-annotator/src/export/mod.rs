//! Export des annotations (fichier GeoJSON téléchargeable)

pub mod geojson;

pub use self::geojson::{export_filename, export_geojson, write_export, GeoJsonExport, GEOJSON_MIME};
