use std::collections::BTreeMap;

use ndarray::{concatenate, Array2, ArrayView2, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};

use crate::bounding_box::convert_box_format;
use crate::common::{BoxFormat, BvrBox};
use crate::error::BvrError;
use crate::Result;

/// Per-level values, either positional or keyed by level name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorLevels {
    List(Vec<f32>),
    Named(BTreeMap<String, f32>),
}

impl AnchorLevels {
    fn len(&self) -> usize {
        match self {
            AnchorLevels::List(v) => v.len(),
            AnchorLevels::Named(m) => m.len(),
        }
    }

    fn entries(&self) -> Vec<(String, f32)> {
        match self {
            AnchorLevels::List(v) => v.iter().enumerate().map(|(i, &x)| (i.to_string(), x)).collect(),
            AnchorLevels::Named(m) => m.iter().map(|(k, &x)| (k.clone(), x)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorGeneratorConfig {
    pub bounding_box_format: String,
    pub sizes: AnchorLevels,
    pub strides: AnchorLevels,
    pub scales: Vec<f32>,
    pub aspect_ratios: Vec<f32>,
    #[serde(default)]
    pub clip_boxes: bool,
}

/// Anchors of one feature level, `(num_anchors, 4)` in the generator's format.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorLevel {
    pub name: String,
    pub anchors: Array2<f32>,
}

#[derive(Debug, Clone, PartialEq)]
struct LevelParams {
    name: String,
    size: f32,
    stride: f32,
}

/// Generates anchor boxes centered on a regular grid for every feature level.
///
/// For each level, every grid cell of `stride` pixels gets `scales.len() * aspect_ratios.len()`
/// anchors, ordered by scale first and aspect ratio second. Cells are visited row by row.
#[derive(Debug, Clone)]
pub struct AnchorGenerator {
    format: BoxFormat,
    levels: Vec<LevelParams>,
    scales: Vec<f32>,
    aspect_ratios: Vec<f32>,
    clip_boxes: bool,
}

impl AnchorGenerator {
    pub fn new(config: AnchorGeneratorConfig) -> Result<Self> {
        let format = BoxFormat::from_str(&config.bounding_box_format)?;

        let levels = match (&config.sizes, &config.strides) {
            (AnchorLevels::List(_), AnchorLevels::List(_)) | (AnchorLevels::Named(_), AnchorLevels::Named(_)) => {
                if config.sizes.len() != config.strides.len() {
                    return Err(BvrError::InvalidConfig(format!(
                        "got {} sizes but {} strides", config.sizes.len(), config.strides.len()
                    )));
                }
                let strides = config.strides.entries();
                config
                    .sizes
                    .entries()
                    .into_iter()
                    .zip(strides)
                    .map(|((name, size), (stride_name, stride))| {
                        if name != stride_name {
                            return Err(BvrError::InvalidConfig(format!(
                                "size level `{}` has no matching stride level (found `{}`)", name, stride_name
                            )));
                        }
                        Ok(LevelParams { name, size, stride })
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            _ => {
                return Err(BvrError::InvalidConfig(
                    "sizes and strides must both be lists or both be named levels".to_string(),
                ))
            }
        };

        if levels.is_empty() {
            return Err(BvrError::InvalidConfig("at least one anchor level is required".to_string()));
        }
        if let Some(level) = levels.iter().find(|l| !(l.size > 0.) || !(l.stride > 0.)) {
            return Err(BvrError::InvalidConfig(format!(
                "level `{}` needs a positive size and stride, got {} and {}", level.name, level.size, level.stride
            )));
        }
        if config.scales.is_empty() || config.scales.iter().any(|&s| !(s > 0.)) {
            return Err(BvrError::InvalidConfig(format!("scales must be positive, got {:?}", config.scales)));
        }
        if config.aspect_ratios.is_empty() || config.aspect_ratios.iter().any(|&r| !(r > 0.)) {
            return Err(BvrError::InvalidConfig(format!(
                "aspect ratios must be positive, got {:?}", config.aspect_ratios
            )));
        }

        Ok(Self {
            format,
            levels,
            scales: config.scales,
            aspect_ratios: config.aspect_ratios,
            clip_boxes: config.clip_boxes,
        })
    }

    pub fn anchors_per_location(&self) -> usize {
        self.scales.len() * self.aspect_ratios.len()
    }

    /// Anchors for an unbatched `(height, width, channels)` image.
    pub fn anchors_for_image(&self, image: ArrayViewD<f32>) -> Result<Vec<AnchorLevel>> {
        if image.ndim() != 3 {
            return Err(BvrError::ShapeMismatch(format!(
                "expected an unbatched image of rank 3 (height, width, channels), got rank {} with shape {:?}",
                image.ndim(),
                image.shape()
            )));
        }
        self.anchors_for_shape((image.shape()[0], image.shape()[1]))
    }

    /// Anchors for an image of `(height, width)` pixels.
    pub fn anchors_for_shape(&self, image_shape: (usize, usize)) -> Result<Vec<AnchorLevel>> {
        let (height, width) = (image_shape.0 as f32, image_shape.1 as f32);

        self.levels
            .iter()
            .map(|level| {
                let yxyx = self.level_anchors(level, height, width);
                let anchors = convert_box_format(yxyx.view(), BoxFormat::Yxyx, self.format, Some((height, width)))?;
                log::debug!("Anchor level `{}`: {} anchors", level.name, anchors.nrows());
                Ok(AnchorLevel { name: level.name.clone(), anchors })
            })
            .collect()
    }

    /// Stacks every level's anchors in level order.
    pub fn concatenate(levels: &[AnchorLevel]) -> Result<Array2<f32>> {
        if levels.is_empty() {
            return Ok(Array2::zeros((0, 4)));
        }
        let views: Vec<ArrayView2<f32>> = levels.iter().map(|l| l.anchors.view()).collect();
        concatenate(Axis(0), &views).map_err(|e| BvrError::ShapeMismatch(e.to_string()))
    }

    fn level_anchors(&self, level: &LevelParams, height: f32, width: f32) -> Array2<f32> {
        // (height, width) of every anchor shape at one location
        let shapes: Vec<(f32, f32)> = self
            .scales
            .iter()
            .flat_map(|&scale| {
                self.aspect_ratios.iter().map(move |&ratio| {
                    let size = level.size * scale;
                    let ratio_sqrt = ratio.sqrt();
                    (size / ratio_sqrt, size * ratio_sqrt)
                })
            })
            .collect();

        let rows = (height / level.stride).ceil() as usize;
        let cols = (width / level.stride).ceil() as usize;

        let mut anchors = Vec::with_capacity(rows * cols * shapes.len());
        for iy in 0..rows {
            let cy = (iy as f32 + 0.5) * level.stride;
            for ix in 0..cols {
                let cx = (ix as f32 + 0.5) * level.stride;
                for &(h, w) in &shapes {
                    let mut anchor = BvrBox::default().with_cxcy_wh(cx, cy, w, h);
                    if self.clip_boxes {
                        anchor = anchor.clip(height, width);
                    }
                    anchors.push(anchor.yxyx());
                }
            }
        }

        Array2::from(anchors)
    }
}
