use std::time::{Duration, Instant};

use ndarray::{ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::bounding_box::to_canonical;
use crate::common::{check_last_dim, BoxFormat, BvrDetection};
use crate::data::{DecoderConfig, DetectionSet, Detections};
use crate::error::BvrError;
use crate::layers::nms::{self, Nms};
use crate::utils;
use crate::Result;

/// Decodes raw box and class predictions into a padded set of detections.
///
/// Boxes are taken as absolute coordinates in the configured format. Each class is
/// suppressed on its own, then the survivors of all classes are merged by score.
#[derive(Debug, Clone)]
pub struct MultiClassNms {
    config: DecoderConfig,
    format: BoxFormat,
}

impl MultiClassNms {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        let format = config.box_format()?;
        log::debug!("MultiClassNms config:\n{}", config.to_string());
        Ok(Self { config, format })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes `(batch, num_boxes, 4)` boxes against `(batch, num_boxes, num_classes)` scores.
    pub fn decode(&self, box_predictions: ArrayView3<f32>, class_predictions: ArrayView3<f32>) -> Result<DetectionSet> {
        let now = Instant::now();
        let mut _decode_elapsed = Duration::default();

        check_last_dim(box_predictions.shape())?;
        let (batch, num_boxes) = (box_predictions.len_of(Axis(0)), box_predictions.len_of(Axis(1)));
        let (score_batch, score_boxes, num_classes) = class_predictions.dim();
        if batch != score_batch {
            return Err(BvrError::ShapeMismatch(format!(
                "box batch size {} does not match class batch size {}", batch, score_batch
            )));
        }
        self.check_scores(num_boxes, score_boxes, num_classes)?;

        log::debug!("MultiClassNms decode: batch={}, boxes={}, classes={}", batch, num_boxes, num_classes);

        let selections: Vec<Vec<BvrDetection>> = box_predictions
            .axis_iter(Axis(0))
            .into_par_iter()
            .zip(class_predictions.axis_iter(Axis(0)).into_par_iter())
            .map(|(boxes, scores)| self.select(boxes, scores))
            .collect();

        _decode_elapsed = utils::trace("TIME", "Suppression", now, _decode_elapsed);

        let detections = DetectionSet::from_selections(&selections, self.config.max_detections);

        utils::trace("TIME", "Padding", now, _decode_elapsed);

        Ok(detections)
    }

    /// Same as [`MultiClassNms::decode`] for one image, `(num_boxes, 4)` and `(num_boxes, num_classes)`.
    pub fn decode_unbatched(&self, box_predictions: ArrayView2<f32>, class_predictions: ArrayView2<f32>) -> Result<Detections> {
        let detections = self.decode(
            box_predictions.insert_axis(Axis(0)),
            class_predictions.insert_axis(Axis(0)),
        )?;
        detections
            .get(0)
            .ok_or_else(|| BvrError::ShapeMismatch("decoder produced an empty batch".to_string()))
    }

    fn check_scores(&self, num_boxes: usize, score_boxes: usize, num_classes: usize) -> Result<()> {
        if num_boxes != score_boxes {
            return Err(BvrError::ShapeMismatch(format!(
                "{} box predictions but {} class predictions", num_boxes, score_boxes
            )));
        }
        match self.config.num_classes {
            Some(nc) if nc != num_classes => Err(BvrError::ShapeMismatch(format!(
                "class predictions have {} classes, expected {}", num_classes, nc
            ))),
            _ => Ok(()),
        }
    }

    /// Per-class suppression and cross-class merge for one batch element.
    fn select(&self, boxes: ArrayView2<f32>, scores: ArrayView2<f32>) -> Vec<BvrDetection> {
        let canonical = to_canonical(boxes, self.format);

        let mut selected: Vec<BvrDetection> = (0..scores.ncols())
            .into_par_iter()
            .flat_map_iter(|class_id| {
                let mut candidates: Vec<BvrDetection> = scores
                    .column(class_id)
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &raw)| {
                        let confidence = self.normalize(raw);
                        // strictly above the threshold
                        if !(confidence > self.config.confidence_threshold) {
                            return None;
                        }
                        let row = boxes.row(i);
                        let det = BvrDetection::new(class_id as isize, [row[0], row[1], row[2], row[3]], confidence)
                            .with_index(i)
                            .with_canonical(canonical[i]);
                        Some(det)
                    })
                    .collect();

                nms::nms(&mut candidates, self.config.iou_threshold, self.config.max_detections_per_class);
                candidates
            })
            .collect();

        selected.sort_by(|a, b| {
            b.confidence()
                .total_cmp(&a.confidence())
                .then_with(|| a.class_id.cmp(&b.class_id))
                .then_with(|| a.index().cmp(&b.index()))
        });
        selected.truncate(self.config.max_detections);
        selected
    }

    fn normalize(&self, score: f32) -> f32 {
        if self.config.from_logits {
            sigmoid(score)
        } else {
            score
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1. / (1. + (-x).exp())
}
