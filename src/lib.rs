mod utils;
pub mod augment;
pub mod bounding_box;
pub mod common;
pub mod data;
pub mod error;
pub mod layers;

use ndarray::ArrayView3;
use crate::data::{DecoderConfig, DetectionSet};

pub use crate::bounding_box::{compute_iou, convert_format};
pub use crate::error::BvrError;
pub use crate::layers::{AnchorGenerator, MultiClassNms};

pub type Result<T, E = BvrError> = std::result::Result<T, E>;

/// Builds a decoder from `config` and runs it once over a batch of predictions.
pub fn decode_predictions(box_predictions: ArrayView3<f32>, class_predictions: ArrayView3<f32>,
                          config: &DecoderConfig) -> Result<DetectionSet> {
    let decoder = MultiClassNms::new(config.clone())?;
    decoder.decode(box_predictions, class_predictions)
}
