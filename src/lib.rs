//! Road defect detection kernel.
//!
//! Turns a camera frame into a list of road-surface defects (cracks,
//! potholes, faded markings, patches) with boxes in original image space.
//!
//! # Pipeline
//!
//! 1. `preprocess`: letterbox the frame onto a square model tile.
//! 2. `detect`: run a pluggable inference backend, normalize its raw
//!    candidates, apply the confidence threshold and optional suppression.
//! 3. `geometry`: map tile-normalized boxes back to image pixels.
//!
//! `render` strokes detections onto the frame. `history` and `report`
//! cover the record shape of a detection session and the plain-text report
//! shared from it.
//!
//! # Module Structure
//!
//! - `catalog`: the fixed defect class table (D00..D40)
//! - `config`: detector configuration (JSON file + `ROADSCAN_*` env)
//! - `geometry`: letterbox math and coordinate mapping

pub mod catalog;
pub mod config;
pub mod detect;
pub mod geometry;
pub mod history;
pub mod preprocess;
pub mod render;
pub mod report;

/// Side length of the square model input tile.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

pub use catalog::DefectClass;
pub use config::DetectorConfig;
pub use detect::{
    filter_detections, BackendCapability, BackendRegistry, ConfidenceThreshold, Detection,
    DetectionEngine, DetectionReport, EngineSettings, InferenceBackend, RawCandidate,
    StubBackend, SuppressionConfig, Tile,
};
pub use geometry::{
    compute_letterbox, map_to_image_coordinates, BoxConvention, GeometryError,
    LetterboxGeometry, Rect, Size,
};
pub use history::{DetectionRecord, HistoryStore, InMemoryHistoryStore, LocationData};
