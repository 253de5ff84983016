use ndarray::{s, Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::common::BvrDetection;
use crate::data::Ragged;

/// Class label written into unfilled slots.
pub const SENTINEL_CLASS: i32 = -1;

/// Padded decoder output for a batch.
///
/// Every element holds exactly `max_detections` slots. Unfilled slots carry class `-1`,
/// confidence `0` and an all-zero box.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct DetectionSet {
    pub boxes: Array3<f32>,
    pub classes: Array2<i32>,
    pub confidence: Array2<f32>,
}

/// Padded decoder output for a single image.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Detections {
    pub boxes: Array2<f32>,
    pub classes: Array1<i32>,
    pub confidence: Array1<f32>,
}

impl DetectionSet {
    /// Pads each element's selections, already ordered and truncated, to `max_detections` slots.
    pub fn from_selections(selections: &[Vec<BvrDetection>], max_detections: usize) -> Self {
        let batch = selections.len();
        let mut boxes = Array3::<f32>::zeros((batch, max_detections, 4));
        let mut classes = Array2::<i32>::from_elem((batch, max_detections), SENTINEL_CLASS);
        let mut confidence = Array2::<f32>::zeros((batch, max_detections));

        for (b, selected) in selections.iter().enumerate() {
            for (slot, det) in selected.iter().take(max_detections).enumerate() {
                boxes.slice_mut(s![b, slot, ..]).assign(&Array1::from(det.bbox.to_vec()));
                classes[[b, slot]] = det.class_id as i32;
                confidence[[b, slot]] = det.confidence;
            }
        }

        Self { boxes, classes, confidence }
    }

    pub fn batch_size(&self) -> usize {
        self.classes.len_of(Axis(0))
    }

    pub fn max_detections(&self) -> usize {
        self.classes.len_of(Axis(1))
    }

    /// Filled slots per batch element.
    pub fn num_detections(&self) -> Vec<usize> {
        self.classes
            .outer_iter()
            .map(|row| row.iter().filter(|&&c| c != SENTINEL_CLASS).count())
            .collect()
    }

    pub fn get(&self, i: usize) -> Option<Detections> {
        if i >= self.batch_size() {
            return None;
        }
        Some(Detections {
            boxes: self.boxes.index_axis(Axis(0), i).to_owned(),
            classes: self.classes.index_axis(Axis(0), i).to_owned(),
            confidence: self.confidence.index_axis(Axis(0), i).to_owned(),
        })
    }

    /// Drops the padding, one row of detections per batch element.
    pub fn to_ragged(&self) -> Ragged<BvrDetection> {
        Ragged::from_rows((0..self.batch_size()).filter_map(|i| self.get(i)).map(|d| d.detections()))
    }
}

impl Detections {
    pub fn num_detections(&self) -> usize {
        self.classes.iter().filter(|&&c| c != SENTINEL_CLASS).count()
    }

    /// Filled slots as detections; `index` is the slot position.
    pub fn detections(&self) -> Vec<BvrDetection> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != SENTINEL_CLASS)
            .map(|(slot, &c)| {
                let row = self.boxes.row(slot);
                BvrDetection::new(c as isize, [row[0], row[1], row[2], row[3]], self.confidence[slot])
                    .with_index(slot)
            })
            .collect()
    }

    /// Rebuilds decoder inputs from this output: each slot becomes an anchor whose only
    /// non-zero score is its confidence under its own class.
    pub fn to_predictions(&self, num_classes: usize) -> (Array2<f32>, Array2<f32>) {
        let slots = self.classes.len();
        let mut scores = Array2::<f32>::zeros((slots, num_classes));
        for (slot, &c) in self.classes.iter().enumerate() {
            if c >= 0 && (c as usize) < num_classes {
                scores[[slot, c as usize]] = self.confidence[slot];
            }
        }
        (self.boxes.clone(), scores)
    }
}
