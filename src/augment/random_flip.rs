use ndarray::{s, Array2, Array3};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::augment::{Augmentation, BoundingBoxes};
use crate::bounding_box::convert_box_format;
use crate::common::BoxFormat;
use crate::error::BvrError;
use crate::Result;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipMode {
    #[default] Horizontal,
    Vertical,
    HorizontalAndVertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomFlipConfig {
    #[serde(default)]
    pub mode: FlipMode,
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default)]
    pub bounding_box_format: Option<String>,
}

fn default_rate() -> f32 {
    0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Mirrors samples left-right and/or top-bottom, each axis with probability `rate`.
#[derive(Debug, Clone)]
pub struct RandomFlip {
    mode: FlipMode,
    rate: f32,
    format: Option<BoxFormat>,
}

impl RandomFlip {
    pub fn new(mode: FlipMode, bounding_box_format: Option<&str>) -> Result<Self> {
        Self::from_config(RandomFlipConfig {
            mode,
            rate: default_rate(),
            bounding_box_format: bounding_box_format.map(str::to_string),
        })
    }

    pub fn from_config(config: RandomFlipConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.rate) {
            return Err(BvrError::InvalidConfig(format!("flip rate must be in [0, 1], got {}", config.rate)));
        }
        let format = config
            .bounding_box_format
            .as_deref()
            .map(BoxFormat::from_str)
            .transpose()?;
        Ok(Self { mode: config.mode, rate: config.rate, format })
    }

    pub fn with_rate(mut self, rate: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(BvrError::InvalidConfig(format!("flip rate must be in [0, 1], got {}", rate)));
        }
        self.rate = rate;
        Ok(self)
    }
}

fn flip_hw(x: Array3<f32>, flip: &Flip) -> Array3<f32> {
    match (flip.vertical, flip.horizontal) {
        (false, false) => x,
        (false, true) => x.slice(s![.., ..;-1, ..]).to_owned(),
        (true, false) => x.slice(s![..;-1, .., ..]).to_owned(),
        (true, true) => x.slice(s![..;-1, ..;-1, ..]).to_owned(),
    }
}

impl Augmentation for RandomFlip {
    type Transformation = Flip;

    fn name(&self) -> &'static str {
        "random_flip"
    }

    fn random_transformation(&self, rng: &mut StdRng) -> Flip {
        let horizontal = matches!(self.mode, FlipMode::Horizontal | FlipMode::HorizontalAndVertical);
        let vertical = matches!(self.mode, FlipMode::Vertical | FlipMode::HorizontalAndVertical);
        Flip {
            horizontal: horizontal && rng.gen::<f32>() < self.rate,
            vertical: vertical && rng.gen::<f32>() < self.rate,
        }
    }

    fn augment_image(&self, image: Array3<f32>, flip: &Flip) -> Result<Array3<f32>> {
        Ok(flip_hw(image, flip))
    }

    fn augment_bounding_boxes(&self, bounding_boxes: BoundingBoxes, flip: &Flip,
                              image_shape: (usize, usize)) -> Result<BoundingBoxes> {
        if !flip.horizontal && !flip.vertical {
            return Ok(bounding_boxes);
        }
        let format = self.format.ok_or_else(|| {
            BvrError::InvalidConfig("random_flip needs a bounding_box_format to flip boxes".to_string())
        })?;

        let (height, width) = (image_shape.0 as f32, image_shape.1 as f32);
        let mut xyxy = convert_box_format(bounding_boxes.boxes.view(), format, BoxFormat::Xyxy, Some((height, width)))?;
        for mut row in xyxy.rows_mut() {
            if flip.horizontal {
                let (x1, x2) = (row[0], row[2]);
                row[0] = width - x2;
                row[2] = width - x1;
            }
            if flip.vertical {
                let (y1, y2) = (row[1], row[3]);
                row[1] = height - y2;
                row[3] = height - y1;
            }
        }
        let boxes = convert_box_format(xyxy.view(), BoxFormat::Xyxy, format, Some((height, width)))?;

        Ok(BoundingBoxes { boxes, classes: bounding_boxes.classes })
    }

    fn augment_keypoints(&self, mut keypoints: Array2<f32>, flip: &Flip,
                         image_shape: (usize, usize)) -> Result<Array2<f32>> {
        if keypoints.ncols() < 2 {
            return Err(BvrError::ShapeMismatch(format!(
                "keypoints must be (num_points, 2) as x, y, got shape {:?}", keypoints.shape()
            )));
        }
        let (height, width) = (image_shape.0 as f32, image_shape.1 as f32);
        for mut point in keypoints.rows_mut() {
            if flip.horizontal {
                point[0] = width - point[0];
            }
            if flip.vertical {
                point[1] = height - point[1];
            }
        }
        Ok(keypoints)
    }

    fn augment_segmentation_mask(&self, mask: Array3<f32>, flip: &Flip) -> Result<Array3<f32>> {
        Ok(flip_hw(mask, flip))
    }
}
