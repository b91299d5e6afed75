use serde::Deserialize;

use super::result::Detection;

/// IoU above which the weaker of two overlapping boxes is suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Optional non-max suppression pass.
///
/// Off by default: models exported with built-in NMS already suppress
/// duplicates, and running it twice only loses recall.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    pub enabled: bool,
    pub iou_threshold: f32,
    /// Suppress across classes instead of only within the same class.
    pub class_agnostic: bool,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            class_agnostic: false,
        }
    }
}

/// Greedy non-max suppression.
///
/// Boxes are ranked by confidence; a box is dropped when it overlaps a
/// stronger kept box by more than `iou_threshold`. Survivors keep their
/// original relative order. Returns the input unchanged when disabled.
pub fn suppress_overlaps(detections: Vec<Detection>, config: &SuppressionConfig) -> Vec<Detection> {
    if !config.enabled || detections.len() < 2 {
        return detections;
    }

    let mut ranked: Vec<usize> = (0..detections.len()).collect();
    ranked.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .total_cmp(&detections[a].confidence)
            .then(a.cmp(&b))
    });

    let iou_threshold = config.iou_threshold as f64;
    let mut keep = vec![false; detections.len()];
    let mut suppressed = vec![false; detections.len()];
    for (pos, &i) in ranked.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep[i] = true;
        for &j in &ranked[pos + 1..] {
            if suppressed[j] {
                continue;
            }
            if !config.class_agnostic && detections[i].class_name != detections[j].class_name {
                continue;
            }
            if detections[i].bounding_box.iou(&detections[j].bounding_box) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    let before = detections.len();
    let kept: Vec<Detection> = detections
        .into_iter()
        .zip(keep)
        .filter_map(|(d, k)| k.then_some(d))
        .collect();
    log::debug!("suppression kept {} of {} detections", kept.len(), before);
    kept
}
