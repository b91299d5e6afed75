use anyhow::{anyhow, Result};

use crate::detect::backend::{BackendCapability, InferenceBackend, Tile};
use crate::detect::candidate::RawCandidate;

/// Stub backend for testing and dry runs.
///
/// Returns a fixed candidate list for every tile, or fails every call when
/// built with [`StubBackend::failing`].
pub struct StubBackend {
    input_size: u32,
    candidates: Vec<RawCandidate>,
    fail_with: Option<String>,
    builtin_suppression: bool,
    calls: usize,
}

impl StubBackend {
    pub fn new(input_size: u32) -> Self {
        Self {
            input_size,
            candidates: Vec::new(),
            fail_with: None,
            builtin_suppression: false,
            calls: 0,
        }
    }

    /// Candidates returned by every inference call.
    pub fn with_candidates(mut self, candidates: Vec<RawCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Advertise [`BackendCapability::BuiltInSuppression`].
    pub fn with_builtin_suppression(mut self) -> Self {
        self.builtin_suppression = true;
        self
    }

    /// A backend whose every inference call fails, like a missing model.
    pub fn failing(input_size: u32, message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new(input_size)
        }
    }

    /// Number of inference calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(crate::DEFAULT_INPUT_SIZE)
    }
}

impl InferenceBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        match capability {
            BackendCapability::ObjectDetection => true,
            BackendCapability::BuiltInSuppression => self.builtin_suppression,
        }
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn run_inference(&mut self, tile: &Tile) -> Result<Vec<RawCandidate>> {
        self.calls += 1;
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }
        if tile.size() != self.input_size {
            return Err(anyhow!(
                "tile side {} does not match model input {}",
                tile.size(),
                self.input_size
            ));
        }
        Ok(self.candidates.clone())
    }
}
