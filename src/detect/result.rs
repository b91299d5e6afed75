use serde::{Deserialize, Serialize};

use crate::catalog::{DefectClass, Rgb};
use crate::geometry::{BoxConvention, GeometryError, LetterboxGeometry, Rect};

/// A validated road defect detection.
///
/// `bounding_box` is top-left based. Straight out of the filter it is
/// normalized to the model tile; after [`Detection::to_image_space`] it is in
/// original-image pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "className")]
    pub class_name: DefectClass,
    pub confidence: f32,
    #[serde(rename = "boundingBox")]
    pub bounding_box: Rect,
}

impl Detection {
    pub fn description(&self) -> &'static str {
        self.class_name.description()
    }

    pub fn color(&self) -> Rgb {
        self.class_name.color()
    }

    /// Confidence as a whole percentage, truncated.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0) as u32
    }

    /// Map the normalized tile box back into original-image pixels.
    pub fn to_image_space(&self, geometry: &LetterboxGeometry) -> Result<Detection, GeometryError> {
        Ok(Detection {
            class_name: self.class_name,
            confidence: self.confidence,
            bounding_box: geometry.unletterbox(self.bounding_box, BoxConvention::Origin)?,
        })
    }
}

/// Outcome of one detection request.
#[derive(Clone, Debug, Default)]
pub struct DetectionReport {
    /// Detections in input order, boxes normalized to the model tile.
    pub detections: Vec<Detection>,
    /// Letterbox used to build the tile. `None` when preprocessing failed.
    pub geometry: Option<LetterboxGeometry>,
}

impl DetectionReport {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Detections mapped into original-image pixels.
    ///
    /// Detections whose box cannot be mapped are skipped.
    pub fn image_space(&self) -> Vec<Detection> {
        let Some(geometry) = self.geometry.as_ref() else {
            return Vec::new();
        };
        self.detections
            .iter()
            .filter_map(|d| match d.to_image_space(geometry) {
                Ok(mapped) => Some(mapped),
                Err(err) => {
                    log::warn!("skipping unmappable {} detection: {}", d.class_name, err);
                    None
                }
            })
            .collect()
    }
}
