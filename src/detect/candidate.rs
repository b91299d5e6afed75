use crate::catalog::DefectClass;
use crate::geometry::{BoxConvention, Rect};

/// One (label, confidence) pair from a typed model output.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Raw, unvalidated model output for a single candidate box.
///
/// Backends emit whichever shape their model produces; [`RawCandidate::normalize`]
/// collapses both into the same form before filtering.
#[derive(Clone, Debug, PartialEq)]
pub enum RawCandidate {
    /// Typed observation: one or more labels, top-left normalized tile box.
    Labeled { labels: Vec<LabelScore>, bbox: Rect },
    /// Raw tensor row: per-class scores in catalog order, center-based normalized tile box.
    ClassScores { scores: Vec<f32>, bbox: Rect },
}

/// A candidate reduced to its top label and a top-left normalized box.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedCandidate {
    pub class: DefectClass,
    pub confidence: f32,
    pub bbox: Rect,
}

/// Why a candidate could not be normalized.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    NoLabels,
    UnknownLabel(String),
    UnknownClassIndex(usize),
    ConfidenceOutOfRange(f32),
    InvalidBox,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoLabels => write!(f, "candidate carries no labels"),
            Rejection::UnknownLabel(label) => write!(f, "unknown label '{}'", label),
            Rejection::UnknownClassIndex(idx) => write!(f, "class index {} outside catalog", idx),
            Rejection::ConfidenceOutOfRange(c) => write!(f, "confidence {} outside [0, 1]", c),
            Rejection::InvalidBox => write!(f, "non-finite or negative-size box"),
        }
    }
}

impl RawCandidate {
    pub fn labeled(labels: Vec<LabelScore>, bbox: Rect) -> Self {
        RawCandidate::Labeled { labels, bbox }
    }

    pub fn class_scores(scores: Vec<f32>, bbox: Rect) -> Self {
        RawCandidate::ClassScores { scores, bbox }
    }

    /// Pick the top label and re-anchor the box at its top-left corner.
    ///
    /// Ties keep the first label seen. A NaN score never wins.
    pub fn normalize(&self) -> Result<NormalizedCandidate, Rejection> {
        let (class, confidence, bbox) = match self {
            RawCandidate::Labeled { labels, bbox } => {
                let top = labels
                    .iter()
                    .filter(|l| !l.confidence.is_nan())
                    .fold(None::<&LabelScore>, |best, l| match best {
                        Some(b) if b.confidence >= l.confidence => Some(b),
                        _ => Some(l),
                    })
                    .ok_or(Rejection::NoLabels)?;
                let class = DefectClass::from_code(top.label.trim())
                    .ok_or_else(|| Rejection::UnknownLabel(top.label.clone()))?;
                (class, top.confidence, *bbox)
            }
            RawCandidate::ClassScores { scores, bbox } => {
                let (index, confidence) = scores
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, s)| !s.is_nan())
                    .fold(None::<(usize, f32)>, |best, (i, s)| match best {
                        Some((_, b)) if b >= s => best,
                        _ => Some((i, s)),
                    })
                    .ok_or(Rejection::NoLabels)?;
                let class =
                    DefectClass::from_index(index).ok_or(Rejection::UnknownClassIndex(index))?;
                (class, confidence, bbox.to_origin(BoxConvention::Center))
            }
        };

        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(Rejection::ConfidenceOutOfRange(confidence));
        }
        if !bbox.is_finite() || bbox.width < 0.0 || bbox.height < 0.0 {
            return Err(Rejection::InvalidBox);
        }
        Ok(NormalizedCandidate {
            class,
            confidence,
            bbox,
        })
    }
}
