use serde::{Deserialize, Serialize};

use crate::common::BvrBox;
use crate::layers::nms::Nms;

/// One decoded detection.
///
/// `bbox` holds the row in the decoder's declared format, `index` the anchor row it
/// was selected from.
#[derive(Default, Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct BvrDetection {
    pub class_id: isize,
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub index: usize,
    #[serde(skip)]
    pub(crate) canonical: BvrBox,
}

impl Nms for BvrDetection {
    fn iou(&self, other: &Self) -> f32 {
        self.canonical.iou(&other.canonical)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn index(&self) -> usize {
        self.index
    }
}

impl BvrDetection {
    pub fn new(class_id: isize, bbox: [f32; 4], confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
            index: 0,
            canonical: BvrBox::default(),
        }
    }

    /// Sets the canonical corner box used for overlap tests.
    pub fn with_canonical(mut self, canonical: BvrBox) -> Self {
        self.canonical = canonical;
        self
    }

    /// Sets the anchor row index the detection came from.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// A slot filled by padding rather than a selection.
    pub fn is_sentinel(&self) -> bool {
        self.class_id < 0
    }
}
