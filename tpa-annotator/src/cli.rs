//! Définition et implémentation des commandes CLI
//!
//! - `reproject`: TPA (UTM) → GeoJSON WGS84
//! - `inspect`: lecture d'un fichier d'annotations d'expert
//! - `annotate`: session d'annotation pilotée par ses canaux d'événements
//! - `criteria`: onglets et critères configurés

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use geojson::{FeatureCollection, GeoJson, JsonObject, Value};
use serde_json::json;
use rayon::prelude::*;
use tokio::sync::mpsc;
use tpa_annotator::layer::layer_bounds;
use tpa_annotator::{
    import_geojson, spawn_tpa_load, write_export, AppConfig, DrawEvent, DrawnShape, LogNotifier,
    Session, SessionReport, SessionStage, SessionStatus, StaticWeightForm,
};
use tpa_reproject::{reproject_feature_collection, CrsRegistry, Reprojector};
use tracing::{debug, info, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Reproject a TPA GeoJSON file (or every .geojson of a directory)
    Reproject {
        /// Input file or directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (or directory when the input is a directory)
        #[arg(short, long)]
        output: PathBuf,

        /// Source CRS identifier (défaut : source_crs de la configuration)
        #[arg(long)]
        from: Option<String>,

        /// Target CRS identifier (défaut : target_crs de la configuration)
        #[arg(long)]
        to: Option<String>,

        /// Config preset name (default/soil) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,
    },

    /// Import an annotation file and print its popups
    Inspect {
        /// GeoJSON file exported by an expert
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run an annotation session and write the export file
    Annotate(AnnotateArgs),

    /// List configured tabs and criteria
    Criteria {
        /// Config preset name (default/soil) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,
    },
}

/// Arguments de la session d'annotation
#[derive(Args)]
pub struct AnnotateArgs {
    /// Expert name
    #[arg(long)]
    pub name: String,

    /// Expert specialty
    #[arg(long)]
    pub specialty: String,

    /// Criterion weight, `criterion=value` (répétable)
    #[arg(short, long = "weight")]
    pub weights: Vec<String>,

    /// Rectangle `min_lon,min_lat,max_lon,max_lat` (répétable)
    #[arg(long = "rect")]
    pub rects: Vec<String>,

    /// Polygon `lon,lat;lon,lat;...` (répétable)
    #[arg(long = "polygon")]
    pub polygons: Vec<String>,

    /// Output directory for `{name}_{specialty}.geojson`
    #[arg(short, long)]
    pub output: PathBuf,

    /// TPA file (défaut : tpa_path de la configuration / TPA_PATH)
    #[arg(long)]
    pub tpas: Option<PathBuf>,

    /// Expert files to load next to the TPA layer (répétable)
    #[arg(long = "import")]
    pub imports: Vec<PathBuf>,

    /// TPA code whose weights are saved with the current form values
    #[arg(long)]
    pub select: Option<String>,

    /// Config preset name (default/soil) or path to a JSON config
    #[arg(long, default_value = "default")]
    pub config: String,

    /// Write the session report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

fn load_config(spec: &str) -> Result<AppConfig> {
    let config = AppConfig::from_spec(spec)?.with_env_overrides();
    debug!(
        source = %config.source_crs,
        target = %config.target_crs,
        tabs = config.tabs.len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Exécute la commande reproject
pub fn cmd_reproject(
    input: &Path,
    output: &Path,
    from: Option<String>,
    to: Option<String>,
    config_spec: &str,
) -> Result<()> {
    let config = load_config(config_spec)?;
    let registry = config.registry()?;
    let source = from.unwrap_or_else(|| config.source_crs.clone());
    let target = to.unwrap_or_else(|| config.target_crs.clone());

    info!(
        "Reproject: input={}, output={}, {} -> {}",
        input.display(),
        output.display(),
        source,
        target
    );

    if input.is_dir() {
        reproject_directory(input, output, &registry, &source, &target)
    } else {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let reprojector = Reprojector::new(&registry, &source, &target)?;
        let count = reproject_file(input, output, &reprojector)?;
        println!(
            "Reprojected {} features ({}) -> {}",
            count,
            reprojector.description(),
            output.display()
        );
        Ok(())
    }
}

fn reproject_directory(
    input: &Path,
    output: &Path,
    registry: &CrsRegistry,
    source: &str,
    target: &str,
) -> Result<()> {
    let files = collect_geojson_files(input)?;
    if files.is_empty() {
        anyhow::bail!("No GeoJSON files found in {}", input.display());
    }
    std::fs::create_dir_all(output)?;
    info!("Found {} files to reproject", files.len());

    let success_count = AtomicUsize::new(0);
    let feature_count = AtomicUsize::new(0);

    // Un reprojector par fichier : le backend PROJ n'est pas partageable entre threads
    files.par_iter().for_each(|path| {
        let result = Reprojector::new(registry, source, target)
            .map_err(anyhow::Error::from)
            .and_then(|reprojector| {
                let name = path.file_name().unwrap_or_default();
                reproject_file(path, &output.join(name), &reprojector)
            });
        match result {
            Ok(count) => {
                success_count.fetch_add(1, Ordering::Relaxed);
                feature_count.fetch_add(count, Ordering::Relaxed);
            }
            Err(e) => warn!("Failed to reproject {}: {:#}", path.display(), e),
        }
    });

    let success = success_count.load(Ordering::Relaxed);
    println!(
        "Reprojection complete: {}/{} files, {} features ({})",
        success,
        files.len(),
        feature_count.load(Ordering::Relaxed),
        target
    );
    if success < files.len() {
        warn!("{} files failed", files.len() - success);
    }
    Ok(())
}

fn collect_geojson_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == "geojson" || ext == "json")
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Reprojette un fichier, retourne le nombre de features écrites
fn reproject_file(input: &Path, output: &Path, reprojector: &Reprojector) -> Result<usize> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let collection = match content
        .parse::<GeoJson>()
        .with_context(|| format!("Failed to parse {}", input.display()))?
    {
        GeoJson::FeatureCollection(fc) => fc,
        _ => anyhow::bail!("{} is not a FeatureCollection", input.display()),
    };

    let mut collection: FeatureCollection = reproject_feature_collection(collection, reprojector)?;
    mark_output_crs(&mut collection, reprojector.target());
    let count = collection.features.len();
    std::fs::write(output, serde_json::to_vec(&collection)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    debug!(input = %input.display(), features = count, "File reprojected");
    Ok(count)
}

/// Membre `crs` du fichier écrit, aligné sur le CRS cible; les bbox en ancien CRS sont retirées
fn mark_output_crs(collection: &mut FeatureCollection, target: &str) {
    collection.bbox = None;
    for feature in &mut collection.features {
        let rewritten = matches!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(Value::MultiPolygon(_))
        );
        if rewritten {
            feature.bbox = None;
        }
    }

    let name = match target.strip_prefix("EPSG:") {
        Some(code) => format!("urn:ogc:def:crs:EPSG::{}", code),
        None => target.to_string(),
    };
    collection
        .foreign_members
        .get_or_insert_with(JsonObject::new)
        .insert(
            "crs".to_string(),
            json!({"type": "name", "properties": {"name": name}}),
        );
}

/// Exécute la commande inspect
pub fn cmd_inspect(input: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let imported = import_geojson(&raw)?;

    println!("{}: {} features", input.display(), imported.len());
    for (index, layer) in imported.layers.iter().enumerate() {
        println!("  [{}] {}", index, layer.popup.as_deref().unwrap_or_default());
    }
    if let Some(bounds) = layer_bounds(&imported.layers) {
        println!(
            "Bounds: [{:.5}, {:.5}, {:.5}, {:.5}]",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
    }
    Ok(())
}

/// Exécute la commande criteria
pub fn cmd_criteria(config_spec: &str) -> Result<()> {
    let config = load_config(config_spec)?;
    for tab in &config.tabs {
        let marker = if tab.name == config.default_tab { " (default)" } else { "" };
        println!("{}{}", tab.name, marker);
        for criterion in &tab.criteria {
            println!("  - {}", criterion);
        }
    }
    Ok(())
}

/// Exécute une session d'annotation complète
///
/// Le chargement des TPA et les formes dessinées arrivent sur les deux canaux
/// de la session, comme depuis la carte; l'export est écrit à la fin.
pub async fn cmd_annotate(args: AnnotateArgs, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let config = load_config(&args.config)?;
    let registry = config.registry()?;
    let reprojector = Reprojector::new(&registry, &config.source_crs, &config.target_crs)?;

    let mut form = StaticWeightForm::from_config(&config);
    for weight in &args.weights {
        let (criterion, value) = parse_weight(weight)?;
        form.set(criterion, value)?;
    }

    let mut shapes = Vec::new();
    for rect in &args.rects {
        shapes.push(parse_rect(rect)?);
    }
    for polygon in &args.polygons {
        shapes.push(parse_polygon(polygon)?);
    }

    let mut report = SessionReport::new(&args.name, &args.specialty);
    let mut session = Session::new(form, LogNotifier);
    session.set_identity(&args.name, &args.specialty);
    if session.start_drawing().is_err() {
        warn!("Drawing not enabled, shapes will be validated one by one");
    }

    let (draw_tx, draw_rx) = mpsc::channel(32);
    let (load_tx, load_rx) = mpsc::channel(1);

    let tpa_path = args.tpas.clone().unwrap_or_else(|| config.tpa_path.clone());
    spawn_tpa_load(tpa_path, reprojector, load_tx);

    let drawn = shapes.len();
    tokio::spawn(async move {
        for shape in shapes {
            if draw_tx.send(DrawEvent::GeometryDrawn(shape)).await.is_err() {
                break;
            }
        }
    });

    session.run(draw_rx, load_rx).await;

    match session.tpa_layers() {
        Some(layers) => report.record_tpa_layer(layers.len(), session.tpa_bounds()),
        None => report.record_error(SessionStage::TpaLoad, "TPA layer not loaded"),
    }

    if let Some(bounds) = layer_bounds(&session.drawn_layers()) {
        debug!(?bounds, "Drawn annotations extent");
    }
    for _ in session.annotations().len()..drawn {
        report.record_error(
            SessionStage::Commit,
            "Shape rejected: missing identity or weights",
        );
    }

    for path in &args.imports {
        let result = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| session.import(&raw).map_err(anyhow::Error::from));
        match result {
            Ok(count) => report.imported_features += count,
            Err(e) => report.record_error(
                SessionStage::Import,
                format!("{}: {}", path.display(), e),
            ),
        }
    }

    if let Some(ref code) = args.select {
        let saved = session
            .select_tpa(code)
            .and_then(|()| session.save_tpa_weights());
        if let Err(e) = saved {
            warn!(tpa = %code, error = %e, "TPA weights not saved");
        }
    }

    match session.export() {
        Ok(export) => {
            let path = write_export(&export, &args.output)?;
            report.record_export(path, export.features);
        }
        Err(e) => report.record_error(SessionStage::Export, e.to_string()),
    }

    report.set_duration(start.elapsed());
    report.finalize();

    if !quiet {
        report.display();
    }
    if let Some(ref path) = args.report {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }

    if report.status == SessionStatus::Failed {
        anyhow::bail!("Annotation session failed: {}", report.summary());
    }
    Ok(())
}

/// `criterion=value`
fn parse_weight(raw: &str) -> Result<(&str, &str)> {
    let (criterion, value) = raw
        .split_once('=')
        .with_context(|| format!("Invalid weight '{}', expected criterion=value", raw))?;
    Ok((criterion.trim(), value.trim()))
}

fn parse_numbers(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|n| {
            n.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid number '{}' in '{}'", n, raw))
        })
        .collect()
}

/// `min_lon,min_lat,max_lon,max_lat`
fn parse_rect(raw: &str) -> Result<DrawnShape> {
    match parse_numbers(raw)?.as_slice() {
        &[min_lon, min_lat, max_lon, max_lat] => {
            Ok(DrawnShape::rectangle(min_lon, min_lat, max_lon, max_lat))
        }
        _ => anyhow::bail!("Invalid rectangle '{}', expected 4 numbers", raw),
    }
}

/// `lon,lat;lon,lat;...` (au moins 3 sommets)
fn parse_polygon(raw: &str) -> Result<DrawnShape> {
    let vertices = raw
        .split(';')
        .filter(|v| !v.trim().is_empty())
        .map(|vertex| match parse_numbers(vertex)?.as_slice() {
            &[lon, lat] => Ok((lon, lat)),
            _ => anyhow::bail!("Invalid vertex '{}', expected lon,lat", vertex),
        })
        .collect::<Result<Vec<_>>>()?;

    if vertices.len() < 3 {
        anyhow::bail!("Polygon '{}' needs at least 3 vertices", raw);
    }
    Ok(DrawnShape::polygon(vertices))
}
