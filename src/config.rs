use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::{
    ConfidenceThreshold, EngineSettings, SuppressionConfig, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_IOU_THRESHOLD,
};
use crate::DEFAULT_INPUT_SIZE;

const MAX_INPUT_SIZE: u32 = 4096;

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
    suppression: Option<SuppressionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SuppressionConfigFile {
    enabled: Option<bool>,
    iou_threshold: Option<f32>,
    class_agnostic: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub suppression: SuppressionConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            suppression: SuppressionConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Load from the JSON file named by `ROADSCAN_CONFIG` (if any), then apply
    /// `ROADSCAN_*` environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ROADSCAN_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectorConfigFile) -> Self {
        let defaults = SuppressionConfig::default();
        let suppression = match file.suppression {
            Some(s) => SuppressionConfig {
                enabled: s.enabled.unwrap_or(defaults.enabled),
                iou_threshold: s.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
                class_agnostic: s.class_agnostic.unwrap_or(defaults.class_agnostic),
            },
            None => defaults,
        };
        Self {
            model_path: file.model_path,
            input_size: file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            suppression,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("ROADSCAN_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(size) = std::env::var("ROADSCAN_INPUT_SIZE") {
            self.input_size = size
                .trim()
                .parse()
                .map_err(|_| anyhow!("ROADSCAN_INPUT_SIZE must be a positive integer"))?;
        }
        if let Ok(threshold) = std::env::var("ROADSCAN_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("ROADSCAN_CONFIDENCE_THRESHOLD must be a number"))?;
        }
        if let Ok(enabled) = std::env::var("ROADSCAN_NMS") {
            self.suppression.enabled = parse_bool("ROADSCAN_NMS", &enabled)?;
        }
        if let Ok(iou) = std::env::var("ROADSCAN_NMS_IOU") {
            self.suppression.iou_threshold = iou
                .trim()
                .parse()
                .map_err(|_| anyhow!("ROADSCAN_NMS_IOU must be a number"))?;
        }
        if let Ok(agnostic) = std::env::var("ROADSCAN_NMS_CLASS_AGNOSTIC") {
            self.suppression.class_agnostic = parse_bool("ROADSCAN_NMS_CLASS_AGNOSTIC", &agnostic)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.input_size > MAX_INPUT_SIZE {
            return Err(anyhow!(
                "input_size must be within 1..={}, got {}",
                MAX_INPUT_SIZE,
                self.input_size
            ));
        }
        ConfidenceThreshold::new(self.confidence_threshold)?;
        let iou = self.suppression.iou_threshold;
        if !iou.is_finite() || iou <= 0.0 || iou > 1.0 {
            return Err(anyhow!("suppression iou_threshold must be within (0, 1], got {}", iou));
        }
        Ok(())
    }

    /// Engine settings derived from this config.
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            confidence_threshold: ConfidenceThreshold::new(self.confidence_threshold)?,
            suppression: self.suppression.clone(),
        })
    }
}

fn read_config_file(path: &Path) -> Result<DetectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{} must be a boolean, got '{}'", name, other)),
    }
}
