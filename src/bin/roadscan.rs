//! roadscan - detect road defects in a still image

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use roadscan::detect::{BackendRegistry, DetectionEngine, StubBackend};
use roadscan::history::{self, DetectionRecord, LocationData};
use roadscan::render::draw_detections;
use roadscan::report::report_message;
use roadscan::DetectorConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image to scan (JPEG or PNG).
    image: PathBuf,
    /// ONNX model path (overrides ROADSCAN_MODEL_PATH).
    #[arg(long)]
    model: Option<PathBuf>,
    /// Minimum confidence, inclusive, in [0, 1].
    #[arg(long)]
    threshold: Option<f32>,
    /// Enable overlap suppression.
    #[arg(long)]
    nms: bool,
    /// IoU above which overlapping boxes are suppressed.
    #[arg(long)]
    iou: Option<f32>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Write a copy of the image with detection boxes drawn to this path.
    #[arg(long, value_name = "OUT")]
    annotate: Option<PathBuf>,
    /// Append the session to this history file.
    #[arg(long)]
    history: Option<PathBuf>,
    /// Latitude recorded with the session.
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,
    /// Longitude recorded with the session.
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = DetectorConfig::load()?;
    if let Some(model) = args.model.clone() {
        cfg.model_path = Some(model);
    }
    if let Some(threshold) = args.threshold {
        cfg.confidence_threshold = threshold;
    }
    if args.nms {
        cfg.suppression.enabled = true;
    }
    if let Some(iou) = args.iou {
        cfg.suppression.iou_threshold = iou;
    }
    cfg.validate()?;

    let mut registry = BackendRegistry::new();
    register_backends(&mut registry, &cfg)?;
    log::info!("available backends: {}", registry.list().join(", "));

    let engine = DetectionEngine::from_registry(&registry, cfg.engine_settings()?)?;
    engine.warm_up()?;
    log::info!(
        "scanning {} with backend '{}' (threshold {}, suppression {})",
        args.image.display(),
        engine.backend_name(),
        engine.confidence_threshold().value(),
        if cfg.suppression.enabled { "on" } else { "off" }
    );

    let image_bytes = std::fs::read(&args.image)
        .map_err(|e| anyhow!("failed to read image {}: {}", args.image.display(), e))?;
    let image = image::load_from_memory(&image_bytes)
        .map_err(|e| anyhow!("failed to decode image {}: {}", args.image.display(), e))?
        .to_rgb8();

    let report = engine.detect(&image);
    let detections = report.image_space();
    log::info!("{} defects found", detections.len());

    if let Some(out) = args.annotate.as_deref() {
        let mut annotated = image.clone();
        let drawn = draw_detections(&mut annotated, &detections);
        annotated
            .save(out)
            .map_err(|e| anyhow!("failed to write annotated image {}: {}", out.display(), e))?;
        log::info!("wrote {} boxes to {}", drawn, out.display());
    }

    let location = match (args.latitude, args.longitude) {
        (Some(lat), Some(lon)) => Some(LocationData::new(lat, lon, None)?),
        _ => None,
    };
    let record = DetectionRecord::new(image_bytes, detections, location);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record.detections)?),
        OutputFormat::Text => print!("{}", report_message(&record)),
    }

    if let Some(path) = args.history.as_deref() {
        let id = record.id.clone();
        let count = history::append_to_file(path, record)?;
        log::info!("saved session {} ({} in history)", id, count);
    }
    Ok(())
}

#[cfg(feature = "backend-tract")]
fn register_backends(registry: &mut BackendRegistry, cfg: &DetectorConfig) -> Result<()> {
    match cfg.model_path.as_deref() {
        Some(path) => {
            let backend = roadscan::detect::TractBackend::new(path, cfg.input_size)?;
            registry.register(backend);
        }
        None => {
            log::warn!("no model configured; using the stub backend (no detections)");
            registry.register(StubBackend::new(cfg.input_size));
        }
    }
    Ok(())
}

#[cfg(not(feature = "backend-tract"))]
fn register_backends(registry: &mut BackendRegistry, cfg: &DetectorConfig) -> Result<()> {
    if cfg.model_path.is_some() {
        log::warn!("built without backend-tract; ignoring model and using the stub backend");
    } else {
        log::warn!("no model configured; using the stub backend (no detections)");
    }
    registry.register(StubBackend::new(cfg.input_size));
    Ok(())
}
