use anyhow::{anyhow, Result};

use super::candidate::RawCandidate;

/// Capabilities a backend may advertise.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendCapability {
    /// Emits road defect candidates from a letterboxed tile.
    ObjectDetection,
    /// The model already applies non-max suppression to its output.
    BuiltInSuppression,
}

/// Square RGB8 model input, row-major, 3 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    size: u32,
    data: Vec<u8>,
}

impl Tile {
    pub fn new(size: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (size as usize)
            .checked_mul(size as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("tile size {} overflows", size))?;
        if size == 0 || data.len() != expected {
            return Err(anyhow!(
                "tile of side {} needs {} RGB bytes, received {}",
                size,
                expected,
                data.len()
            ));
        }
        Ok(Self { size, data })
    }

    /// All-black tile.
    pub fn blank(size: u32) -> Result<Self> {
        let len = (size as usize)
            .checked_mul(size as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("tile size {} overflows", size))?;
        Self::new(size, vec![0; len])
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// Inference backend.
///
/// A backend turns one letterboxed tile into raw candidates. It does not
/// threshold, suppress or re-map boxes; that is the filter's job. Returning
/// an error is allowed: the engine treats any failure as "no detections".
pub trait InferenceBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: BackendCapability) -> bool;

    /// Side of the square tile the model expects.
    fn input_size(&self) -> u32;

    /// Run the model on a tile.
    fn run_inference(&mut self, tile: &Tile) -> Result<Vec<RawCandidate>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
