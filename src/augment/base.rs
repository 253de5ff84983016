use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::BvrError;
use crate::Result;

/// Boxes of one sample, in the format the augmentation is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxes {
    pub boxes: Array2<f32>,
    pub classes: Array1<f32>,
}

/// Data kinds a sample can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Image,
    Label,
    BoundingBoxes,
    Keypoints,
    SegmentationMask,
}

/// One sample and whichever modalities come with it.
///
/// `extras` is carried through augmentation untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub image: Option<Array3<f32>>,
    pub labels: Option<Array1<f32>>,
    pub bounding_boxes: Option<BoundingBoxes>,
    pub keypoints: Option<Array2<f32>>,
    pub segmentation_mask: Option<Array3<f32>>,
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl Sample {
    pub fn new(image: Array3<f32>) -> Self {
        Self {
            image: Some(image),
            ..Default::default()
        }
    }

    /// Casts an 8-bit `(height, width, channels)` image to `f32` without rescaling.
    pub fn from_u8_image(image: Array3<u8>) -> Self {
        Self::new(image.mapv(f32::from))
    }

    pub fn with_labels(mut self, labels: Array1<f32>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_bounding_boxes(mut self, boxes: Array2<f32>, classes: Array1<f32>) -> Self {
        self.bounding_boxes = Some(BoundingBoxes { boxes, classes });
        self
    }

    pub fn with_keypoints(mut self, keypoints: Array2<f32>) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    pub fn with_segmentation_mask(mut self, mask: Array3<f32>) -> Self {
        self.segmentation_mask = Some(mask);
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }

    pub fn modalities(&self) -> Vec<Modality> {
        let mut present = Vec::new();
        if self.image.is_some() {
            present.push(Modality::Image);
        }
        if self.labels.is_some() {
            present.push(Modality::Label);
        }
        if self.bounding_boxes.is_some() {
            present.push(Modality::BoundingBoxes);
        }
        if self.keypoints.is_some() {
            present.push(Modality::Keypoints);
        }
        if self.segmentation_mask.is_some() {
            present.push(Modality::SegmentationMask);
        }
        present
    }

    /// `(height, width)` of the image, if there is one.
    pub fn image_shape(&self) -> Option<(usize, usize)> {
        self.image.as_ref().map(|img| (img.shape()[0], img.shape()[1]))
    }
}

/// Input of an augmentation call. Batched samples may hold images of different sizes.
#[derive(Debug, Clone, PartialEq)]
pub enum AugmentInput {
    Single(Sample),
    Batched(Vec<Sample>),
}

/// A random augmentation with one hook per modality.
///
/// Every hook defaults to returning its input, so an augmentation only overrides the
/// modalities it changes. A single transformation is drawn per sample and shared by all
/// of that sample's modalities.
pub trait Augmentation: Send + Sync {
    type Transformation: Send;

    fn name(&self) -> &'static str;

    fn random_transformation(&self, rng: &mut StdRng) -> Self::Transformation;

    fn augment_image(&self, image: Array3<f32>, _transformation: &Self::Transformation) -> Result<Array3<f32>> {
        Ok(image)
    }

    fn augment_label(&self, labels: Array1<f32>, _transformation: &Self::Transformation) -> Result<Array1<f32>> {
        Ok(labels)
    }

    fn augment_bounding_boxes(&self, bounding_boxes: BoundingBoxes, _transformation: &Self::Transformation,
                              _image_shape: (usize, usize)) -> Result<BoundingBoxes> {
        Ok(bounding_boxes)
    }

    fn augment_keypoints(&self, keypoints: Array2<f32>, _transformation: &Self::Transformation,
                         _image_shape: (usize, usize)) -> Result<Array2<f32>> {
        Ok(keypoints)
    }

    fn augment_segmentation_mask(&self, mask: Array3<f32>, _transformation: &Self::Transformation) -> Result<Array3<f32>> {
        Ok(mask)
    }

    /// Draws one transformation and runs every hook for the modalities present.
    fn augment_sample(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        let image_shape = sample.image_shape().ok_or(BvrError::MissingInput("images"))?;
        let transformation = self.random_transformation(rng);

        let Sample { image, labels, bounding_boxes, keypoints, segmentation_mask, extras } = sample;

        Ok(Sample {
            image: image.map(|x| self.augment_image(x, &transformation)).transpose()?,
            labels: labels.map(|x| self.augment_label(x, &transformation)).transpose()?,
            bounding_boxes: bounding_boxes
                .map(|x| self.augment_bounding_boxes(x, &transformation, image_shape))
                .transpose()?,
            keypoints: keypoints
                .map(|x| self.augment_keypoints(x, &transformation, image_shape))
                .transpose()?,
            segmentation_mask: segmentation_mask
                .map(|x| self.augment_segmentation_mask(x, &transformation))
                .transpose()?,
            extras,
        })
    }
}

/// Applies `layer` to a single sample or to every sample of a batch in parallel.
///
/// Sample `i` draws from an RNG seeded with `seed + i`, so a batch gets independent
/// transformations and the same seed reproduces the same output.
pub fn apply<A: Augmentation>(layer: &A, input: AugmentInput, seed: u64) -> Result<AugmentInput> {
    match input {
        AugmentInput::Single(sample) => {
            let mut rng = StdRng::seed_from_u64(seed);
            Ok(AugmentInput::Single(layer.augment_sample(sample, &mut rng)?))
        }
        AugmentInput::Batched(samples) => {
            log::trace!("{}: augmenting batch of {}", Augmentation::name(layer), samples.len());
            let samples = samples
                .into_par_iter()
                .enumerate()
                .map(|(i, sample)| {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                    layer.augment_sample(sample, &mut rng)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(AugmentInput::Batched(samples))
        }
    }
}

/// Object-safe view of an [`Augmentation`], used by the registry.
pub trait DynAugmentation: Send + Sync {
    fn layer_name(&self) -> &'static str;
    fn augment(&self, input: AugmentInput, seed: u64) -> Result<AugmentInput>;
}

impl<A: Augmentation> DynAugmentation for A {
    fn layer_name(&self) -> &'static str {
        Augmentation::name(self)
    }

    fn augment(&self, input: AugmentInput, seed: u64) -> Result<AugmentInput> {
        apply(self, input, seed)
    }
}
