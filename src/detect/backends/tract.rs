#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::catalog::DefectClass;
use crate::detect::backend::{BackendCapability, InferenceBackend, Tile};
use crate::detect::candidate::{LabelScore, RawCandidate};
use crate::geometry::Rect;

/// Anchors whose best class score is below this are not emitted.
const DEFAULT_SCORE_FLOOR: f32 = 0.01;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// Two output layouts are understood:
/// - raw `[1, 4 + C, N]`: center boxes in tile pixels followed by per-class scores;
/// - NMS export `[1, N, 6]`: `x1, y1, x2, y2, score, class` rows.
///
/// The model is loaded from a local file; inference performs no I/O.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
    builtin_suppression: bool,
    score_floor: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for `input_size` square tiles.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)))
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        let builtin_suppression = model
            .model()
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.last() == Some(&6)))
            .unwrap_or(false);
        log::info!(
            "loaded {} (input {}x{}, built-in nms: {})",
            model_path.display(),
            input_size,
            input_size,
            builtin_suppression
        );

        Ok(Self {
            model,
            input_size,
            builtin_suppression,
            score_floor: DEFAULT_SCORE_FLOOR,
        })
    }

    /// Override the per-anchor score floor applied to raw outputs.
    pub fn with_score_floor(mut self, floor: f32) -> Self {
        self.score_floor = floor;
        self
    }

    fn build_input(&self, tile: &Tile) -> Result<Tensor> {
        if tile.size() != self.input_size {
            return Err(anyhow!(
                "tile side {} does not match model input {}",
                tile.size(),
                self.input_size
            ));
        }

        let side = self.input_size as usize;
        let pixels = tile.pixels();
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
            let idx = (y * side + x) * 3 + channel;
            pixels[idx] as f32 / 255.0
        });

        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<Vec<RawCandidate>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape().to_vec();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(anyhow!("unexpected output shape {:?}", shape));
        }

        let side = self.input_size as f64;
        let classes = DefectClass::ALL.len();
        let mut candidates = Vec::new();

        if shape[2] == 6 {
            let rows = shape[1];
            // Exports differ on whether boxes are normalized; pixel boxes exceed 1.
            let max_coord = (0..rows)
                .flat_map(|i| (0..4).map(move |k| (i, k)))
                .map(|(i, k)| view[[0, i, k]])
                .fold(0.0f32, f32::max);
            let norm = if max_coord > 1.0 { side } else { 1.0 };
            for i in 0..rows {
                let score = view[[0, i, 4]];
                if score.is_nan() || score <= 0.0 {
                    continue;
                }
                let Some(label) = class_label(view[[0, i, 5]]) else {
                    log::debug!("skipping row {} with class id {}", i, view[[0, i, 5]]);
                    continue;
                };
                let bbox = Rect::from_corners(
                    view[[0, i, 0]] as f64 / norm,
                    view[[0, i, 1]] as f64 / norm,
                    view[[0, i, 2]] as f64 / norm,
                    view[[0, i, 3]] as f64 / norm,
                );
                candidates.push(RawCandidate::labeled(vec![LabelScore::new(label, score)], bbox));
            }
        } else if shape[1] == 4 + classes {
            for j in 0..shape[2] {
                let scores: Vec<f32> = (0..classes).map(|k| view[[0, 4 + k, j]]).collect();
                let best = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                if best.is_nan() || best < self.score_floor {
                    continue;
                }
                let bbox = Rect::new(
                    view[[0, 0, j]] as f64 / side,
                    view[[0, 1, j]] as f64 / side,
                    view[[0, 2, j]] as f64 / side,
                    view[[0, 3, j]] as f64 / side,
                );
                candidates.push(RawCandidate::class_scores(scores, bbox));
            }
        } else {
            return Err(anyhow!(
                "output shape {:?} matches neither [1, {}, N] nor [1, N, 6]",
                shape,
                4 + classes
            ));
        }

        Ok(candidates)
    }
}

/// Label for a class id column of an NMS export.
///
/// Ids outside the catalog keep their number so the filter can report them;
/// non-finite or negative ids give `None`.
fn class_label(raw: f32) -> Option<String> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let class_index = raw.round() as usize;
    Some(
        DefectClass::from_index(class_index)
            .map(|c| c.code().to_string())
            .unwrap_or_else(|| class_index.to_string()),
    )
}

impl InferenceBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
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
        let input = self.build_input(tile)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let tile = Tile::blank(self.input_size)?;
        self.run_inference(&tile).map(|_| ())
    }
}
