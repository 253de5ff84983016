use ndarray::{Array2, Array3, ArrayD, ArrayView2, Axis, Ix2, Ix3};
use serde::{Deserialize, Serialize};

use crate::error::BvrError;
use crate::Result;

/// A set of boxes, flat `(num_boxes, 4)` or batched `(batch, num_boxes, 4)`.
///
/// Deserialized sets go through the same trailing dimension check as the constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoxSet")]
pub enum BoxSet {
    Unbatched(Array2<f32>),
    Batched(Array3<f32>),
}

#[derive(Deserialize)]
enum RawBoxSet {
    Unbatched(Array2<f32>),
    Batched(Array3<f32>),
}

impl TryFrom<RawBoxSet> for BoxSet {
    type Error = BvrError;

    fn try_from(raw: RawBoxSet) -> Result<Self> {
        match raw {
            RawBoxSet::Unbatched(boxes) => BoxSet::unbatched(boxes),
            RawBoxSet::Batched(boxes) => BoxSet::batched(boxes),
        }
    }
}

impl BoxSet {
    pub fn unbatched(boxes: Array2<f32>) -> Result<Self> {
        check_last_dim(boxes.shape())?;
        Ok(BoxSet::Unbatched(boxes))
    }

    pub fn batched(boxes: Array3<f32>) -> Result<Self> {
        check_last_dim(boxes.shape())?;
        Ok(BoxSet::Batched(boxes))
    }

    /// Accepts rank-2 or rank-3 input with a trailing dimension of 4.
    pub fn from_dyn(boxes: ArrayD<f32>) -> Result<Self> {
        match boxes.ndim() {
            2 => {
                let boxes = boxes
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| BvrError::ShapeMismatch(e.to_string()))?;
                BoxSet::unbatched(boxes)
            }
            3 => {
                let boxes = boxes
                    .into_dimensionality::<Ix3>()
                    .map_err(|e| BvrError::ShapeMismatch(e.to_string()))?;
                BoxSet::batched(boxes)
            }
            n => Err(BvrError::ShapeMismatch(format!(
                "boxes must have rank 2 or 3, got rank {} with shape {:?}",
                n,
                boxes.shape()
            ))),
        }
    }

    pub fn from_rows(rows: &[[f32; 4]]) -> Self {
        BoxSet::Unbatched(Array2::from(rows.to_vec()))
    }

    pub fn batch_size(&self) -> Option<usize> {
        match self {
            BoxSet::Unbatched(_) => None,
            BoxSet::Batched(b) => Some(b.len_of(Axis(0))),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            BoxSet::Unbatched(b) => b.shape(),
            BoxSet::Batched(b) => b.shape(),
        }
    }

    pub fn num_boxes(&self) -> usize {
        match self {
            BoxSet::Unbatched(b) => b.nrows(),
            BoxSet::Batched(b) => b.len_of(Axis(1)),
        }
    }

    /// Rows seen by batch element `i`. Unbatched sets and batches of one repeat across every element.
    pub(crate) fn element(&self, i: usize) -> ArrayView2<'_, f32> {
        match self {
            BoxSet::Unbatched(b) => b.view(),
            BoxSet::Batched(b) if b.len_of(Axis(0)) == 1 => b.index_axis(Axis(0), 0),
            BoxSet::Batched(b) => b.index_axis(Axis(0), i),
        }
    }
}

impl TryFrom<Array2<f32>> for BoxSet {
    type Error = BvrError;

    fn try_from(boxes: Array2<f32>) -> Result<Self> {
        BoxSet::unbatched(boxes)
    }
}

impl TryFrom<Array3<f32>> for BoxSet {
    type Error = BvrError;

    fn try_from(boxes: Array3<f32>) -> Result<Self> {
        BoxSet::batched(boxes)
    }
}

impl TryFrom<ArrayD<f32>> for BoxSet {
    type Error = BvrError;

    fn try_from(boxes: ArrayD<f32>) -> Result<Self> {
        BoxSet::from_dyn(boxes)
    }
}

/// Pairwise overlap ratios, `(num_a, num_b)` or `(batch, num_a, num_b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IouMatrix {
    Unbatched(Array2<f32>),
    Batched(Array3<f32>),
}

impl IouMatrix {
    pub fn shape(&self) -> &[usize] {
        match self {
            IouMatrix::Unbatched(m) => m.shape(),
            IouMatrix::Batched(m) => m.shape(),
        }
    }

    pub fn as_unbatched(&self) -> Option<&Array2<f32>> {
        match self {
            IouMatrix::Unbatched(m) => Some(m),
            IouMatrix::Batched(_) => None,
        }
    }

    pub fn as_batched(&self) -> Option<&Array3<f32>> {
        match self {
            IouMatrix::Unbatched(_) => None,
            IouMatrix::Batched(m) => Some(m),
        }
    }

    pub fn into_dyn(self) -> ArrayD<f32> {
        match self {
            IouMatrix::Unbatched(m) => m.into_dyn(),
            IouMatrix::Batched(m) => m.into_dyn(),
        }
    }
}

pub(crate) fn check_last_dim(shape: &[usize]) -> Result<()> {
    match shape.last() {
        Some(4) => Ok(()),
        _ => Err(BvrError::ShapeMismatch(format!(
            "boxes must have a trailing dimension of 4, got shape {:?}",
            shape
        ))),
    }
}
