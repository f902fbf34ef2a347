//! Session d'annotation : contexte explicite d'un expert devant la carte
//!
//! La surface cartographique pousse ses événements sur deux canaux :
//! - les géométries dessinées / éditées / supprimées (`DrawEvent`)
//! - le résultat du chargement des TPA (`TpaLoadResult`)
//!
//! Les formulaires sont lus via un accesseur injecté (`WeightForm`) au moment du
//! commit; les messages bloquants passent par un `Notifier`.

use std::collections::BTreeMap;

use geo::Rect;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{AnnotatorError, Result};
use crate::export::{export_geojson, GeoJsonExport};
use crate::form::WeightForm;
use crate::import::{import_geojson, ImportedLayer};
use crate::layer::{drawn_layers, layer_bounds, tpa_code, tpa_layers, DrawnShape, RenderLayer};
use crate::model::{validate_commit, AnnotationCollection, AnnotationId, Identity, WeightSnapshot};
use crate::tpa::TpaLoadResult;

/// Notification bloquante à l'utilisateur (équivalent d'une alerte)
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Notifications écrites dans les logs (CLI)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        warn!(target: "tpa_annotator::alert", "{}", message);
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn alert(&self, message: &str) {
        (**self).alert(message)
    }
}

/// État de l'outil de dessin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// Identité/pondérations pas encore validées
    Idle,
    /// L'expert peut dessiner
    Pending,
}

/// Événements de la barre de dessin/édition
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// Dessin terminé
    GeometryDrawn(DrawnShape),
    /// Géométrie modifiée par l'outil d'édition
    LayerEdited(AnnotationId, DrawnShape),
    /// Couche supprimée par l'outil de suppression
    LayerDeleted(AnnotationId),
}

/// Contexte d'une session d'annotation
pub struct Session<F: WeightForm, N: Notifier> {
    identity: Identity,
    form: F,
    notifier: N,
    state: DrawState,
    annotations: AnnotationCollection,
    tpa_layers: Option<Vec<RenderLayer>>,
    imported: Vec<ImportedLayer>,
    selected_tpa: Option<String>,
    tpa_weights: BTreeMap<String, WeightSnapshot>,
}

impl<F: WeightForm, N: Notifier> Session<F, N> {
    pub fn new(form: F, notifier: N) -> Self {
        Self {
            identity: Identity::default(),
            form,
            notifier,
            state: DrawState::Idle,
            annotations: AnnotationCollection::new(),
            tpa_layers: None,
            imported: Vec::new(),
            selected_tpa: None,
            tpa_weights: BTreeMap::new(),
        }
    }

    /// Saisie du nom et de la spécialité de l'expert
    pub fn set_identity(&mut self, author_name: &str, author_specialty: &str) {
        self.identity = Identity::new(author_name, author_specialty);
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn annotations(&self) -> &AnnotationCollection {
        &self.annotations
    }

    /// Annotations commitées, avec le style des formes dessinées
    pub fn drawn_layers(&self) -> Vec<RenderLayer> {
        drawn_layers(&self.annotations)
    }

    /// Couches TPA, `None` tant que le chargement n'a pas abouti
    pub fn tpa_layers(&self) -> Option<&[RenderLayer]> {
        self.tpa_layers.as_deref()
    }

    /// Emprise des TPA pour cadrer la carte
    pub fn tpa_bounds(&self) -> Option<Rect<f64>> {
        self.tpa_layers.as_deref().and_then(layer_bounds)
    }

    pub fn imported_layers(&self) -> &[ImportedLayer] {
        &self.imported
    }

    pub fn selected_tpa(&self) -> Option<&str> {
        self.selected_tpa.as_deref()
    }

    pub fn tpa_weights(&self, code: &str) -> Option<&WeightSnapshot> {
        self.tpa_weights.get(code)
    }

    /// Alerte l'utilisateur et retourne l'erreur inchangée
    fn fail<T>(&self, err: AnnotatorError) -> Result<T> {
        match &err {
            AnnotatorError::Validation(message) => self.notifier.alert(message),
            other => self.notifier.alert(&other.to_string()),
        }
        Err(err)
    }

    /// Valide identité et pondérations, puis active le dessin
    pub fn start_drawing(&mut self) -> Result<()> {
        let weights = self.form.snapshot();
        if let Err(err) = validate_commit(&self.identity, &weights) {
            return self.fail(err);
        }
        self.state = DrawState::Pending;
        info!(author = %self.identity.author_name, "Drawing enabled");
        self.notifier.alert("You can now start drawing.");
        Ok(())
    }

    /// Dessin terminé : pondérations lues maintenant, puis commit
    pub fn commit_drawn(&mut self, shape: &DrawnShape) -> Result<AnnotationId> {
        if self.state == DrawState::Idle {
            debug!("Geometry drawn before drawing was enabled");
        }
        let weights = self.form.snapshot();
        match self
            .annotations
            .commit(shape.to_geometry(), &self.identity, &weights)
        {
            Ok(id) => Ok(id),
            Err(err) => self.fail(err),
        }
    }

    pub fn edit(&mut self, id: AnnotationId, shape: &DrawnShape) -> Result<()> {
        self.annotations.replace_geometry(id, shape.to_geometry())
    }

    pub fn delete(&mut self, id: AnnotationId) -> Result<()> {
        self.annotations.remove(id).map(|_| ())
    }

    /// Traite un événement de la barre de dessin; les échecs sont déjà notifiés/loggés
    pub fn handle_draw_event(&mut self, event: DrawEvent) {
        let result = match event {
            DrawEvent::GeometryDrawn(shape) => self.commit_drawn(&shape).map(|_| ()),
            DrawEvent::LayerEdited(id, shape) => self.edit(id, &shape),
            DrawEvent::LayerDeleted(id) => self.delete(id),
        };
        if let Err(err) = result {
            debug!(error = %err, "Draw event rejected");
        }
    }

    /// Fin du chargement des TPA; un échec laisse la carte sans couche TPA
    pub fn on_tpa_loaded(&mut self, result: TpaLoadResult) {
        match result {
            Ok(collection) => {
                let layers = tpa_layers(&collection);
                info!(layers = layers.len(), "TPA layer added");
                self.tpa_layers = Some(layers);
                if let Some(bounds) = self.tpa_bounds() {
                    debug!(?bounds, "Map zoomed to TPA bounds");
                }
            }
            Err(err) => error!(error = %err, "Error loading TPA GeoJSON"),
        }
    }

    /// Clic sur une TPA : ouvre le formulaire pour ce code
    pub fn select_tpa(&mut self, code: &str) -> Result<()> {
        let known = self
            .tpa_layers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|layer| tpa_code(&layer.feature) == code);
        if !known {
            return Err(AnnotatorError::validation(format!("Unknown TPA: {}", code)));
        }
        self.selected_tpa = Some(code.to_string());
        Ok(())
    }

    /// Enregistre les pondérations courantes pour la TPA sélectionnée
    pub fn save_tpa_weights(&mut self) -> Result<()> {
        let Some(code) = self.selected_tpa.clone() else {
            return self.fail(AnnotatorError::validation("Select a TPA first."));
        };
        let weights = self.form.snapshot();
        info!(tpa = %code, weights = ?weights, "Weights for TPA");
        self.tpa_weights.insert(code.clone(), weights);
        self.notifier
            .alert(&format!("Weights for TPA {} saved!", code));
        Ok(())
    }

    /// Bouton "Finish" : fichier d'export des annotations
    pub fn export(&self) -> Result<GeoJsonExport> {
        match export_geojson(
            &self.annotations,
            &self.identity.author_name,
            &self.identity.author_specialty,
        ) {
            Ok(export) => Ok(export),
            Err(err) => self.fail(err),
        }
    }

    /// Chargement d'un fichier d'expert; retourne le nombre de features ajoutées
    pub fn import(&mut self, raw: &str) -> Result<usize> {
        match import_geojson(raw) {
            Ok(layer) => {
                let count = layer.len();
                self.imported.push(layer);
                Ok(count)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Boucle d'événements : tourne jusqu'à fermeture des deux canaux
    pub async fn run(
        &mut self,
        mut draw_rx: mpsc::Receiver<DrawEvent>,
        mut load_rx: mpsc::Receiver<TpaLoadResult>,
    ) {
        let mut draw_open = true;
        let mut load_open = true;

        while draw_open || load_open {
            tokio::select! {
                event = draw_rx.recv(), if draw_open => match event {
                    Some(event) => self.handle_draw_event(event),
                    None => draw_open = false,
                },
                result = load_rx.recv(), if load_open => match result {
                    Some(result) => self.on_tpa_loaded(result),
                    None => load_open = false,
                },
            }
        }

        debug!(annotations = self.annotations.len(), "Session event loop ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::StaticWeightForm;
    use geojson::{Feature, FeatureCollection, JsonObject};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }
    }

    fn filled_form() -> StaticWeightForm {
        let mut form = StaticWeightForm::new(["salinity", "slope"]);
        form.set("salinity", "3").unwrap();
        form.set("slope", "1").unwrap();
        form
    }

    fn square() -> DrawnShape {
        DrawnShape::rectangle(45.9, 28.4, 46.0, 28.5)
    }

    fn tpa_collection() -> FeatureCollection {
        let mut properties = JsonObject::new();
        properties.insert("TPA_Code".into(), "HB-01".into());
        let mut feature = Feature::from(square().to_geometry());
        feature.properties = Some(properties);
        FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }
    }

    #[test]
    fn test_start_drawing_requires_identity_and_weights() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(StaticWeightForm::new(["salinity"]), &notifier);

        assert!(session.start_drawing().is_err());
        assert_eq!(session.state(), DrawState::Idle);

        session.set_identity("Jane", "soil");
        assert!(session.start_drawing().is_err());

        session.form_mut().set("salinity", "4").unwrap();
        session.start_drawing().unwrap();
        assert_eq!(session.state(), DrawState::Pending);
        assert_eq!(notifier.alerts.borrow().last().unwrap(), "You can now start drawing.");
    }

    #[test]
    fn test_weights_read_at_commit_time() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);
        session.set_identity("Jane", "soil");
        session.start_drawing().unwrap();

        session.form_mut().set("salinity", "5").unwrap();
        let id = session.commit_drawn(&square()).unwrap();

        let annotation = session.annotations().get(id).unwrap();
        assert_eq!(
            annotation.feature.property("weights"),
            Some(&serde_json::json!({"salinity": "5", "slope": "1"}))
        );
    }

    #[test]
    fn test_commit_rejected_when_weight_cleared() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);
        session.set_identity("Jane", "soil");
        session.start_drawing().unwrap();

        session.form_mut().set("slope", "").unwrap();
        assert!(session.commit_drawn(&square()).is_err());
        assert!(session.annotations().is_empty());
        assert!(notifier.alerts.borrow().last().unwrap().contains("assign weights"));
    }

    #[test]
    fn test_draw_events() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);
        session.set_identity("Jane", "soil");

        session.handle_draw_event(DrawEvent::GeometryDrawn(square()));
        session.handle_draw_event(DrawEvent::GeometryDrawn(square()));
        assert_eq!(session.annotations().len(), 2);

        let first = session.annotations().iter().next().unwrap().id;
        session.handle_draw_event(DrawEvent::LayerEdited(
            first,
            DrawnShape::rectangle(45.0, 28.0, 45.1, 28.1),
        ));
        session.handle_draw_event(DrawEvent::LayerDeleted(first));
        assert_eq!(session.annotations().len(), 1);

        // Suppression d'une couche inconnue : ignorée
        session.handle_draw_event(DrawEvent::LayerDeleted(first));
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_export_validation_alerts() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);
        session.set_identity("", "soil");

        assert!(session.export().is_err());
        assert_eq!(
            notifier.alerts.borrow().last().unwrap(),
            "Please enter your name and select your specialty."
        );

        session.set_identity("Jane", "soil");
        session.commit_drawn(&square()).unwrap();
        let export = session.export().unwrap();
        assert_eq!(export.filename, "Jane_soil.geojson");

        let drawn = session.drawn_layers();
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].style, crate::layer::LayerStyle::DRAWN);
        assert_eq!(drawn[0].popup.as_deref(), Some("Expert: Jane<br>Specialty: soil"));
    }

    #[test]
    fn test_import_failure_is_visible() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);

        assert!(session.import("definitely not geojson").is_err());
        assert!(session.imported_layers().is_empty());
        assert_eq!(notifier.alerts.borrow().len(), 1);
    }

    #[test]
    fn test_tpa_load_and_weights() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);

        session.on_tpa_loaded(Err(AnnotatorError::load("data/tpas.geojson", "not found")));
        assert!(session.tpa_layers().is_none());
        assert!(session.select_tpa("HB-01").is_err());

        assert!(session.save_tpa_weights().is_err());

        session.on_tpa_loaded(Ok(tpa_collection()));
        assert_eq!(session.tpa_layers().unwrap().len(), 1);
        assert_eq!(
            session.tpa_layers().unwrap()[0].popup.as_deref(),
            Some("TPA ID: HB-01")
        );
        assert!(session.tpa_bounds().is_some());

        session.select_tpa("HB-01").unwrap();
        session.save_tpa_weights().unwrap();
        assert_eq!(session.tpa_weights("HB-01").unwrap().get("salinity"), Some("3"));
        assert_eq!(
            notifier.alerts.borrow().last().unwrap(),
            "Weights for TPA HB-01 saved!"
        );
    }

    #[tokio::test]
    async fn test_run_consumes_both_channels() {
        let notifier = RecordingNotifier::default();
        let mut session = Session::new(filled_form(), &notifier);
        session.set_identity("Jane", "soil");

        let (draw_tx, draw_rx) = mpsc::channel(8);
        let (load_tx, load_rx) = mpsc::channel(1);

        draw_tx.send(DrawEvent::GeometryDrawn(square())).await.unwrap();
        draw_tx.send(DrawEvent::GeometryDrawn(square())).await.unwrap();
        load_tx.send(Ok(tpa_collection())).await.unwrap();
        drop(draw_tx);
        drop(load_tx);

        session.run(draw_rx, load_rx).await;

        assert_eq!(session.annotations().len(), 2);
        assert!(session.tpa_layers().is_some());
    }
}
