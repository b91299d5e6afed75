//! Road defect classes and their display metadata.
//!
//! The six codes and their descriptions are part of the stored history format
//! and must not change.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// sRGB display color.
pub type Rgb = [u8; 3];

/// Color used for codes outside the catalog.
pub const FALLBACK_COLOR: Rgb = [142, 142, 147];

/// Closed set of road defect categories, in model class-index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefectClass {
    #[serde(rename = "D00")]
    LongitudinalCrack,
    #[serde(rename = "D01")]
    TransverseCrack,
    #[serde(rename = "D10")]
    AlligatorCrack,
    #[serde(rename = "D11")]
    Pothole,
    #[serde(rename = "D20")]
    MarkingBlur,
    #[serde(rename = "D40")]
    RoadRepair,
}

impl DefectClass {
    /// All classes, indexed by model class id.
    pub const ALL: [DefectClass; 6] = [
        DefectClass::LongitudinalCrack,
        DefectClass::TransverseCrack,
        DefectClass::AlligatorCrack,
        DefectClass::Pothole,
        DefectClass::MarkingBlur,
        DefectClass::RoadRepair,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            DefectClass::LongitudinalCrack => "D00",
            DefectClass::TransverseCrack => "D01",
            DefectClass::AlligatorCrack => "D10",
            DefectClass::Pothole => "D11",
            DefectClass::MarkingBlur => "D20",
            DefectClass::RoadRepair => "D40",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.code() == code)
    }

    pub fn description(self) -> &'static str {
        match self {
            DefectClass::LongitudinalCrack => "Longitudinal Crack",
            DefectClass::TransverseCrack => "Transverse Crack",
            DefectClass::AlligatorCrack => "Alligator Crack",
            DefectClass::Pothole => "Pothole",
            DefectClass::MarkingBlur => "Marking Blur",
            DefectClass::RoadRepair => "Road Repair",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            DefectClass::LongitudinalCrack => [0, 122, 255],
            DefectClass::TransverseCrack => [255, 59, 48],
            DefectClass::AlligatorCrack => [255, 148, 0],
            DefectClass::Pothole => [176, 82, 222],
            DefectClass::MarkingBlur => [255, 204, 0],
            DefectClass::RoadRepair => [51, 199, 89],
        }
    }
}

impl std::fmt::Display for DefectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DefectClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s.trim()).ok_or_else(|| anyhow!("unknown defect class code '{}'", s))
    }
}

/// Human description for a raw class code; unknown codes describe as themselves.
pub fn description_for(code: &str) -> &str {
    DefectClass::from_code(code)
        .map(DefectClass::description)
        .unwrap_or(code)
}

/// Display color for a raw class code; unknown codes get [`FALLBACK_COLOR`].
pub fn color_for(code: &str) -> Rgb {
    DefectClass::from_code(code)
        .map(DefectClass::color)
        .unwrap_or(FALLBACK_COLOR)
}
