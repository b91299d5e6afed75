use anyhow::{anyhow, Result};

use super::candidate::{RawCandidate, Rejection};
use super::result::Detection;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Minimum confidence for a detection to be surfaced, in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfidenceThreshold(f32);

impl ConfidenceThreshold {
    pub fn new(value: f32) -> Result<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                value
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Replace the threshold. The old value is kept when `value` is invalid.
    pub fn set(&mut self, value: f32) -> Result<()> {
        *self = Self::new(value)?;
        Ok(())
    }

    /// Inclusive: a confidence equal to the threshold passes.
    pub fn admits(self, confidence: f32) -> bool {
        confidence >= self.0
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

/// Turn raw model candidates into validated detections.
///
/// Each candidate is reduced to its top label; it is kept when that label's
/// confidence is at least `threshold`. Output order follows input order.
/// Overlapping boxes for the same defect all pass through: suppression is a
/// separate, opt-in pass.
pub fn filter_detections(candidates: &[RawCandidate], threshold: ConfidenceThreshold) -> Vec<Detection> {
    let mut detections = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let normalized = match candidate.normalize() {
            Ok(normalized) => normalized,
            Err(reason) => {
                log_rejection(index, &reason);
                continue;
            }
        };
        if !threshold.admits(normalized.confidence) {
            continue;
        }
        detections.push(Detection {
            class_name: normalized.class,
            confidence: normalized.confidence,
            bounding_box: normalized.bbox,
        });
    }
    log::debug!(
        "kept {} of {} candidates at threshold {}",
        detections.len(),
        candidates.len(),
        threshold.value()
    );
    detections
}

fn log_rejection(index: usize, reason: &Rejection) {
    match reason {
        Rejection::ConfidenceOutOfRange(_) | Rejection::InvalidBox => {
            log::warn!("dropping candidate #{}: {}", index, reason)
        }
        _ => log::debug!("dropping candidate #{}: {}", index, reason),
    }
}
