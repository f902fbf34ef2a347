//! Rapport de session d'annotation avec graceful degradation
//!
//! Collecte ce qui a été chargé, validé, rejeté et exporté pendant une session
//! pilotée par la CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use geo::Rect;
use serde::Serialize;

/// Statut global de la session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    /// Export écrit, aucune erreur
    Success,
    /// Export écrit, mais des formes ou la couche TPA ont été rejetées
    PartialSuccess,
    /// Aucun export
    Failed,
}

/// Étape en échec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStage {
    TpaLoad,
    Commit,
    Import,
    Export,
}

/// Erreur non fatale avec contexte
#[derive(Debug, Clone, Serialize)]
pub struct SessionError {
    pub stage: SessionStage,
    pub message: String,
}

/// Rapport complet de session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub author_name: String,
    pub author_specialty: String,
    pub duration_secs: f64,
    pub status: SessionStatus,

    /// Nombre de TPA affichées (None si la couche n'a pas été chargée)
    pub tpa_features: Option<usize>,
    /// Emprise des TPA [min_lon, min_lat, max_lon, max_lat]
    pub tpa_bounds: Option<[f64; 4]>,

    pub annotations_committed: usize,
    pub annotations_rejected: usize,
    pub imported_features: usize,

    /// Fichier exporté
    pub output: Option<PathBuf>,

    pub errors: Vec<SessionError>,
}

impl SessionReport {
    pub fn new(author_name: &str, author_specialty: &str) -> Self {
        Self {
            author_name: author_name.to_string(),
            author_specialty: author_specialty.to_string(),
            duration_secs: 0.0,
            status: SessionStatus::Success,
            tpa_features: None,
            tpa_bounds: None,
            annotations_committed: 0,
            annotations_rejected: 0,
            imported_features: 0,
            output: None,
            errors: Vec::new(),
        }
    }

    /// Enregistre la couche TPA affichée
    pub fn record_tpa_layer(&mut self, features: usize, bounds: Option<Rect<f64>>) {
        self.tpa_features = Some(features);
        self.tpa_bounds = bounds.map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]);
    }

    pub fn record_error(&mut self, stage: SessionStage, message: impl Into<String>) {
        if stage == SessionStage::Commit {
            self.annotations_rejected += 1;
        }
        self.errors.push(SessionError {
            stage,
            message: message.into(),
        });
    }

    pub fn record_export(&mut self, path: PathBuf, annotations: usize) {
        self.output = Some(path);
        self.annotations_committed = annotations;
    }

    /// Définit la durée de la session
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = match (&self.output, self.errors.is_empty()) {
            (None, _) => SessionStatus::Failed,
            (Some(_), true) => SessionStatus::Success,
            (Some(_), false) => SessionStatus::PartialSuccess,
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!(
            "ANNOTATION REPORT - {} ({})",
            self.author_name, self.author_specialty
        );
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        match (self.tpa_features, self.tpa_bounds) {
            (Some(n), Some([x0, y0, x1, y1])) => println!(
                "TPA layer: {} features, bounds [{:.5}, {:.5}, {:.5}, {:.5}]",
                n, x0, y0, x1, y1
            ),
            (Some(n), None) => println!("TPA layer: {} features", n),
            (None, _) => println!("TPA layer: not loaded"),
        }
        println!(
            "Annotations: {} committed, {} rejected",
            self.annotations_committed, self.annotations_rejected
        );
        if self.imported_features > 0 {
            println!("Imported: {} features", self.imported_features);
        }
        if let Some(ref output) = self.output {
            println!("Output: {}", output.display());
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                println!("  {:?} {}", e.stage, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}_{}: {} committed, {} rejected, {} errors",
            self.author_name,
            self.author_specialty,
            self.annotations_committed,
            self.annotations_rejected,
            self.errors.len()
        )
    }
}
