//! Export des annotations en GeoJSON

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::model::{AnnotationCollection, Identity};

/// Type MIME du fichier exporté
pub const GEOJSON_MIME: &str = "application/json";

/// Fichier prêt à être téléchargé
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonExport {
    /// `{authorName}_{authorSpecialty}.geojson`
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// Nombre de features exportées
    pub features: usize,
}

/// Nom du fichier d'export pour une identité
pub fn export_filename(identity: &Identity) -> String {
    format!(
        "{}_{}.geojson",
        identity.author_name, identity.author_specialty
    )
}

/// Sérialise les annotations; nom et spécialité sont nettoyés puis exigés non vides
pub fn export_geojson(
    collection: &AnnotationCollection,
    author_name: &str,
    author_specialty: &str,
) -> Result<GeoJsonExport> {
    let identity = Identity::new(author_name, author_specialty).validated()?;

    let feature_collection = collection.to_feature_collection();
    let bytes = serde_json::to_vec(&feature_collection)?;

    Ok(GeoJsonExport {
        filename: export_filename(&identity),
        mime: GEOJSON_MIME,
        bytes,
        features: feature_collection.features.len(),
    })
}

/// Nom de fichier sans séparateur de chemin : l'écriture reste dans le répertoire cible
fn safe_file_name(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

/// Écrit l'export dans un répertoire, retourne le chemin du fichier
pub fn write_export(export: &GeoJsonExport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(safe_file_name(&export.filename));

    let file = File::create(&output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&export.bytes)?;
    writer.flush()?;

    info!(
        path = %output_path.display(),
        features = export.features,
        bytes = export.bytes.len(),
        "Annotations exported"
    );
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotatorError;
    use crate::model::{WeightSnapshot, AUTHOR_NAME};
    use geojson::{GeoJson, Geometry, Value};

    fn collection_with_one() -> AnnotationCollection {
        let mut collection = AnnotationCollection::new();
        let weights: WeightSnapshot = [("salinity", "2")].into_iter().collect();
        collection
            .commit(
                Geometry::new(Value::Polygon(vec![vec![
                    vec![45.9, 28.4],
                    vec![46.0, 28.4],
                    vec![46.0, 28.5],
                    vec![45.9, 28.4],
                ]])),
                &Identity::new("Jane", "soil"),
                &weights,
            )
            .unwrap();
        collection
    }

    #[test]
    fn test_export_requires_identity() {
        let collection = collection_with_one();
        assert!(matches!(
            export_geojson(&collection, "", "soil"),
            Err(AnnotatorError::Validation(_))
        ));
        assert!(export_geojson(&collection, "Jane", "  ").is_err());
    }

    #[test]
    fn test_export_filename_and_content() {
        let export = export_geojson(&collection_with_one(), " Jane ", "soil").unwrap();
        assert_eq!(export.filename, "Jane_soil.geojson");
        assert_eq!(export.mime, "application/json");
        assert_eq!(export.features, 1);

        let parsed: GeoJson = std::str::from_utf8(&export.bytes).unwrap().parse().unwrap();
        let GeoJson::FeatureCollection(fc) = parsed else {
            panic!("Expected FeatureCollection");
        };
        assert_eq!(fc.features.len(), 1);
        assert_eq!(
            fc.features[0].property(AUTHOR_NAME),
            Some(&serde_json::json!("Jane"))
        );
        assert_eq!(
            fc.features[0].property("weights"),
            Some(&serde_json::json!({"salinity": "2"}))
        );
    }

    #[test]
    fn test_export_empty_collection() {
        let export = export_geojson(&AnnotationCollection::new(), "Jane", "soil").unwrap();
        assert_eq!(export.features, 0);
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tpa_annotator_export_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_write_export() {
        let export = export_geojson(&collection_with_one(), "Jane", "soil").unwrap();
        let output_dir = temp_dir("write");

        let path = write_export(&export, &output_dir).unwrap();
        assert!(path.ends_with("Jane_soil.geojson"));
        assert_eq!(std::fs::read(&path).unwrap(), export.bytes);

        std::fs::remove_dir_all(output_dir).ok();
    }

    #[test]
    fn test_write_export_stays_in_output_dir() {
        let root = temp_dir("escape");
        let output_dir = root.join("out");

        let export = export_geojson(&collection_with_one(), "../escape", "soil").unwrap();
        assert_eq!(export.filename, "../escape_soil.geojson");
        let path = write_export(&export, &output_dir).unwrap();
        assert_eq!(path.parent(), Some(output_dir.as_path()));
        assert!(path.ends_with(".._escape_soil.geojson"));
        assert!(!root.join("escape_soil.geojson").exists());

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_write_export_name_with_separator() {
        let output_dir = temp_dir("separator");

        let export = export_geojson(&collection_with_one(), "Jane/Doe", "soil\\water").unwrap();
        let path = write_export(&export, &output_dir).unwrap();
        assert!(path.ends_with("Jane_Doe_soil_water.geojson"));
        assert_eq!(std::fs::read(&path).unwrap(), export.bytes);

        std::fs::remove_dir_all(output_dir).ok();
    }
}
