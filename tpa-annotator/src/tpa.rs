//! Chargement de la couche TPA : lecture, parsing puis reprojection (une seule fois)

use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tpa_reproject::{reproject_feature_collection, Reprojector};
use tracing::{debug, info};

use crate::error::{AnnotatorError, Result};

/// Résultat du chargement, transmis sur le canal "collection chargée"
pub type TpaLoadResult = Result<FeatureCollection>;

/// Lit le fichier des TPA et le reprojette vers le CRS d'affichage
pub async fn load_tpa_collection(path: &Path, reprojector: &Reprojector) -> TpaLoadResult {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AnnotatorError::load(path.display().to_string(), e.to_string()))?;

    let collection = parse_feature_collection(&content)
        .map_err(|reason| AnnotatorError::load(path.display().to_string(), reason))?;
    debug!(
        path = %path.display(),
        features = collection.features.len(),
        "Original TPA collection parsed"
    );

    let collection = reproject_feature_collection(collection, reprojector)?;
    info!(
        path = %path.display(),
        features = collection.features.len(),
        backend = reprojector.description(),
        "TPA collection reprojected"
    );
    Ok(collection)
}

fn parse_feature_collection(content: &str) -> std::result::Result<FeatureCollection, String> {
    match content.parse::<GeoJson>().map_err(|e| e.to_string())? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err("expected a FeatureCollection".to_string()),
    }
}

/// Lance le chargement sur une tâche
///
/// Le résultat, succès ou échec, est envoyé sur `sender`.
pub fn spawn_tpa_load(
    path: PathBuf,
    reprojector: Reprojector,
    sender: mpsc::Sender<TpaLoadResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = load_tpa_collection(&path, &reprojector).await;
        if sender.send(result).await.is_err() {
            debug!("Session closed before the TPA collection was delivered");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpa_reproject::{CrsRegistry, UTM_39N, WGS84};

    fn reprojector() -> Reprojector {
        Reprojector::new(&CrsRegistry::with_defaults(), UTM_39N, WGS84).unwrap()
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_and_reproject() {
        let path = temp_file(
            "tpa_annotator_load.geojson",
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"TPA_Code":"HB-01"},
               "geometry":{"type":"MultiPolygon","coordinates":[[[[6000,3155000],[7000,3155000],[7000,3156000],[6000,3155000]]]]}}]}"#,
        );

        let fc = load_tpa_collection(&path, &reprojector()).await.unwrap();
        assert_eq!(fc.features.len(), 1);
        let Some(geojson::Value::MultiPolygon(mp)) = fc.features[0].geometry.as_ref().map(|g| &g.value)
        else {
            panic!("Expected MultiPolygon geometry");
        };
        assert!((mp[0][0][0][0] - 45.96).abs() < 0.05);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let result = load_tpa_collection(Path::new("/nonexistent/tpas.geojson"), &reprojector()).await;
        assert!(matches!(result, Err(AnnotatorError::Load { .. })));
    }

    #[tokio::test]
    async fn test_not_a_collection() {
        let path = temp_file(
            "tpa_annotator_not_fc.geojson",
            r#"{"type":"Point","coordinates":[1,2]}"#,
        );
        let result = load_tpa_collection(&path, &reprojector()).await;
        assert!(matches!(result, Err(AnnotatorError::Load { .. })));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_spawned_load_sends_result() {
        let (tx, mut rx) = mpsc::channel(1);
        spawn_tpa_load(
            PathBuf::from("/nonexistent/tpas.geojson"),
            reprojector(),
            tx,
        );
        let result = rx.recv().await.unwrap();
        assert!(result.is_err());
    }
}
