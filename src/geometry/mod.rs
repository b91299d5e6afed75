//! Letterbox geometry and coordinate mapping.
//!
//! Everything here is pure: no logging, no shared state. Degenerate inputs
//! (zero or negative sizes, NaN, infinities) are rejected with
//! [`GeometryError`] instead of leaking non-finite rectangles downstream.

mod letterbox;
mod mapper;
mod rect;

pub use letterbox::{compute_letterbox, LetterboxGeometry};
pub use mapper::{map_to_image_coordinates, map_to_normalized};
pub use rect::{BoxConvention, Point, Rect, Size};

/// Invalid geometry input.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryError {
    /// A dimension, coordinate or offset was non-finite or out of range.
    InvalidInput { what: &'static str, value: f64 },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::InvalidInput { what, value } => {
                write!(f, "invalid geometry input: {} = {}", what, value)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

pub(crate) fn require_positive(what: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::InvalidInput { what, value })
    }
}

pub(crate) fn require_finite(what: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::InvalidInput { what, value })
    }
}

pub(crate) fn require_non_negative(what: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::InvalidInput { what, value })
    }
}
