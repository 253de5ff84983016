//! Options for the multi-class NMS decoder.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::common::BoxFormat;
use crate::error::BvrError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "default_bounding_box_format")]
    pub bounding_box_format: String,
    #[serde(default)]
    pub from_logits: bool,
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
    #[serde(default = "default_max_detections_per_class")]
    pub max_detections_per_class: Option<usize>,
    // None accepts any trailing score dimension
    #[serde(default)]
    pub num_classes: Option<usize>,
}

fn default_bounding_box_format() -> String {
    BoxFormat::Xyxy.str().to_string()
}

fn default_iou_threshold() -> f32 {
    0.5
}

fn default_confidence_threshold() -> f32 {
    0.05
}

fn default_max_detections() -> usize {
    100
}

fn default_max_detections_per_class() -> Option<usize> {
    Some(100)
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            bounding_box_format: default_bounding_box_format(),
            from_logits: false,
            iou_threshold: default_iou_threshold(),
            confidence_threshold: default_confidence_threshold(),
            max_detections: default_max_detections(),
            max_detections_per_class: default_max_detections_per_class(),
            num_classes: None,
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DecoderConfig =
            serde_json::from_str(json).map_err(|e| BvrError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read decoder config {}", path.display()))?;
        let config = Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse decoder config {}", path.display()))?;
        Ok(config)
    }

    pub fn with_bounding_box_format(mut self, format: &str) -> Self {
        self.bounding_box_format = format.to_string();
        self
    }

    pub fn with_from_logits(mut self, x: bool) -> Self {
        self.from_logits = x;
        self
    }

    pub fn with_iou(mut self, x: f32) -> Self {
        self.iou_threshold = x;
        self
    }

    pub fn with_confidence(mut self, x: f32) -> Self {
        self.confidence_threshold = x;
        self
    }

    pub fn with_max_detections(mut self, n: usize) -> Self {
        self.max_detections = n;
        self
    }

    pub fn with_max_detections_per_class(mut self, n: Option<usize>) -> Self {
        self.max_detections_per_class = n;
        self
    }

    pub fn with_nc(mut self, nc: usize) -> Self {
        self.num_classes = Some(nc);
        self
    }

    pub fn box_format(&self) -> Result<BoxFormat> {
        BoxFormat::from_str(&self.bounding_box_format)
    }

    pub fn validate(&self) -> Result<()> {
        self.box_format()?;

        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(BvrError::InvalidConfig(format!(
                "iou_threshold must be in [0, 1], got {}", self.iou_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(BvrError::InvalidConfig(format!(
                "confidence_threshold must be in [0, 1], got {}", self.confidence_threshold
            )));
        }
        if self.max_detections == 0 {
            return Err(BvrError::InvalidConfig("max_detections must be positive".to_string()));
        }
        if self.max_detections_per_class == Some(0) {
            return Err(BvrError::InvalidConfig("max_detections_per_class must be positive".to_string()));
        }
        if self.num_classes == Some(0) {
            return Err(BvrError::InvalidConfig("num_classes must be positive".to_string()));
        }

        Ok(())
    }

    pub fn to_string(&self) -> String {
        format!("Bounding Box Format: {}\n\
        From Logits: {}\n\
        IoU Threshold: {}\n\
        Confidence Threshold: {}\n\
        Max Detections: {}\n\
        Max Detections Per Class: {:?}\n\
        Num Classes: {:?}",
                self.bounding_box_format, self.from_logits, self.iou_threshold,
                self.confidence_threshold, self.max_detections,
                self.max_detections_per_class, self.num_classes)
    }
}
