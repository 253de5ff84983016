use ndarray::Array3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::augment::Augmentation;
use crate::error::BvrError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomBrightnessConfig {
    pub factor: f32,
    #[serde(default = "default_value_range")]
    pub value_range: (f32, f32),
}

fn default_value_range() -> (f32, f32) {
    (0., 255.)
}

/// Shifts image intensities by up to `factor` of the value range, then clips into the range.
///
/// Only the image changes; geometry-bearing modalities pass through.
#[derive(Debug, Clone)]
pub struct RandomBrightness {
    factor: f32,
    value_range: (f32, f32),
}

impl RandomBrightness {
    pub fn new(factor: f32, value_range: (f32, f32)) -> Result<Self> {
        Self::from_config(RandomBrightnessConfig { factor, value_range })
    }

    pub fn from_config(config: RandomBrightnessConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.factor) {
            return Err(BvrError::InvalidConfig(format!(
                "brightness factor must be in [0, 1], got {}", config.factor
            )));
        }
        let (low, high) = config.value_range;
        if !(low < high) {
            return Err(BvrError::InvalidConfig(format!(
                "value_range must be increasing, got ({}, {})", low, high
            )));
        }
        Ok(Self { factor: config.factor, value_range: config.value_range })
    }
}

impl Augmentation for RandomBrightness {
    // additive delta in image units
    type Transformation = f32;

    fn name(&self) -> &'static str {
        "random_brightness"
    }

    fn random_transformation(&self, rng: &mut StdRng) -> f32 {
        let (low, high) = self.value_range;
        rng.gen_range(-self.factor..=self.factor) * (high - low)
    }

    fn augment_image(&self, image: Array3<f32>, delta: &f32) -> Result<Array3<f32>> {
        let (low, high) = self.value_range;
        Ok(image.mapv(|x| (x + delta).clamp(low, high)))
    }
}
