mod backend;
mod backends;
mod candidate;
mod engine;
mod filter;
mod registry;
mod result;
mod suppress;

pub use backend::{BackendCapability, InferenceBackend, Tile};
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use candidate::{LabelScore, NormalizedCandidate, RawCandidate, Rejection};
pub use engine::{DetectionEngine, EngineSettings};
pub use filter::{filter_detections, ConfidenceThreshold, DEFAULT_CONFIDENCE_THRESHOLD};
pub use registry::{BackendRegistry, SharedBackend};
pub use result::{Detection, DetectionReport};
pub use suppress::{suppress_overlaps, SuppressionConfig, DEFAULT_IOU_THRESHOLD};
