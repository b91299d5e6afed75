use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Result};
use image::RgbImage;

use super::backend::{BackendCapability, InferenceBackend};
use super::candidate::RawCandidate;
use super::filter::{filter_detections, ConfidenceThreshold};
use super::registry::{lock_backend, BackendRegistry, SharedBackend};
use super::result::DetectionReport;
use super::suppress::{suppress_overlaps, SuppressionConfig};
use super::Tile;
use crate::preprocess::letterbox_tile;

/// Per-engine tuning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineSettings {
    pub confidence_threshold: ConfidenceThreshold,
    pub suppression: SuppressionConfig,
}

/// Runs the letterbox -> inference -> filter -> suppression pipeline.
///
/// Detection is fail-soft: preprocessing or backend failures are logged and
/// reported as an empty detection list, never as an error. Clones share the
/// same backend.
#[derive(Clone)]
pub struct DetectionEngine {
    backend: SharedBackend,
    backend_name: &'static str,
    input_size: u32,
    settings: EngineSettings,
}

impl DetectionEngine {
    pub fn new<B: InferenceBackend + 'static>(backend: B, settings: EngineSettings) -> Result<Self> {
        Self::from_shared(Arc::new(Mutex::new(backend)), settings)
    }

    /// Use the registry backend that handles object detection.
    pub fn from_registry(registry: &BackendRegistry, settings: EngineSettings) -> Result<Self> {
        let backend = registry.backend_for_capability(BackendCapability::ObjectDetection)?;
        Self::from_shared(backend, settings)
    }

    pub fn from_shared(backend: SharedBackend, settings: EngineSettings) -> Result<Self> {
        let (backend_name, input_size, builtin_nms) = {
            let guard = lock_backend(&backend);
            (
                guard.name(),
                guard.input_size(),
                guard.supports(BackendCapability::BuiltInSuppression),
            )
        };
        if input_size == 0 {
            return Err(anyhow!("backend '{}' reports a zero input size", backend_name));
        }
        if !builtin_nms && !settings.suppression.enabled {
            log::warn!(
                "backend '{}' has no built-in suppression and suppression is disabled; \
                 overlapping duplicates will be reported",
                backend_name
            );
        }
        Ok(Self {
            backend,
            backend_name,
            input_size,
            settings,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn confidence_threshold(&self) -> ConfidenceThreshold {
        self.settings.confidence_threshold
    }

    /// Replace the threshold used by [`DetectionEngine::detect`].
    pub fn set_confidence_threshold(&mut self, value: f32) -> Result<()> {
        self.settings.confidence_threshold.set(value)
    }

    pub fn warm_up(&self) -> Result<()> {
        lock_backend(&self.backend).warm_up()
    }

    /// Detect with the engine's configured threshold.
    pub fn detect(&self, image: &RgbImage) -> DetectionReport {
        self.detect_with_threshold(image, self.settings.confidence_threshold)
    }

    /// Detect with an explicit threshold.
    pub fn detect_with_threshold(&self, image: &RgbImage, threshold: ConfidenceThreshold) -> DetectionReport {
        let started = Instant::now();
        let (tile, geometry) = match letterbox_tile(image, self.input_size) {
            Ok(prepared) => prepared,
            Err(err) => {
                log::warn!("preprocessing failed, reporting no detections: {:#}", err);
                return DetectionReport::default();
            }
        };

        let candidates = match self.infer(&tile) {
            Ok(candidates) => candidates,
            Err(err) => {
                log::warn!(
                    "backend '{}' failed, reporting no detections: {:#}",
                    self.backend_name,
                    err
                );
                return DetectionReport {
                    detections: Vec::new(),
                    geometry: Some(geometry),
                };
            }
        };

        let detections = filter_detections(&candidates, threshold);
        let detections = suppress_overlaps(detections, &self.settings.suppression);
        log::debug!(
            "{} detections from {} candidates in {:?}",
            detections.len(),
            candidates.len(),
            started.elapsed()
        );

        DetectionReport {
            detections,
            geometry: Some(geometry),
        }
    }

    /// Run detection on a background thread and deliver exactly one report.
    ///
    /// There is no cancellation and no timeout. A panic anywhere in the
    /// request is reported as an empty result.
    pub fn spawn_detect(&self, image: RgbImage) -> Receiver<DetectionReport> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.detect_with_callback(image, move |report| {
            // The caller may have dropped the receiver; nothing to do then.
            let _ = tx.send(report);
        });
        rx
    }

    /// Run detection on a background thread and hand the report to `callback`.
    pub fn detect_with_callback<F>(&self, image: RgbImage, callback: F)
    where
        F: FnOnce(DetectionReport) + Send + 'static,
    {
        let engine = self.clone();
        std::thread::spawn(move || {
            let report = panic::catch_unwind(AssertUnwindSafe(|| engine.detect(&image)))
                .unwrap_or_else(|_| {
                    log::warn!("detection thread panicked, reporting no detections");
                    DetectionReport::default()
                });
            callback(report);
        });
    }

    /// A panicking backend counts as a failed request; the lock stays usable.
    fn infer(&self, tile: &Tile) -> Result<Vec<RawCandidate>> {
        let mut guard = lock_backend(&self.backend);
        panic::catch_unwind(AssertUnwindSafe(|| guard.run_inference(tile)))
            .unwrap_or_else(|_| Err(anyhow!("backend '{}' panicked", self.backend_name)))
    }
}
