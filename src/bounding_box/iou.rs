use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;

use crate::bounding_box::convert::to_canonical;
use crate::common::{check_last_dim, BoxFormat, BoxSet, IouMatrix};
use crate::error::BvrError;
use crate::Result;

/// Pairwise IoU between two box sets sharing `bounding_box_format`.
///
/// Rows of the result follow `boxes_a`, columns follow `boxes_b`. When either side carries a
/// batch dimension the result is batched, and an unbatched side (or a batch of one) is reused
/// for every batch element.
///
/// Relative formats are compared as-is, since IoU does not change under per-axis scaling.
pub fn compute_iou(boxes_a: &BoxSet, boxes_b: &BoxSet, bounding_box_format: &str) -> Result<IouMatrix> {
    let format = BoxFormat::from_str(bounding_box_format)?;
    // trailing dimension of 4 on both sides
    check_last_dim(boxes_a.shape())?;
    check_last_dim(boxes_b.shape())?;

    if let (BoxSet::Unbatched(a), BoxSet::Unbatched(b)) = (boxes_a, boxes_b) {
        return Ok(IouMatrix::Unbatched(pairwise_iou(a.view(), b.view(), format)));
    }

    let batch = broadcast_batch(boxes_a.batch_size(), boxes_b.batch_size())?;
    let mut result = Array3::<f32>::zeros((batch, boxes_a.num_boxes(), boxes_b.num_boxes()));

    result
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut out)| {
            out.assign(&pairwise_iou(boxes_a.element(i), boxes_b.element(i), format));
        });

    Ok(IouMatrix::Batched(result))
}

/// IoU table for one batch element.
pub(crate) fn pairwise_iou(boxes_a: ArrayView2<f32>, boxes_b: ArrayView2<f32>, format: BoxFormat) -> Array2<f32> {
    let a = to_canonical(boxes_a, format);
    let b = to_canonical(boxes_b, format);
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i].iou(&b[j]))
}

fn broadcast_batch(a: Option<usize>, b: Option<usize>) -> Result<usize> {
    match (a, b) {
        (Some(n), None) | (None, Some(n)) => Ok(n),
        (Some(n), Some(m)) if n == m => Ok(n),
        (Some(1), Some(m)) => Ok(m),
        (Some(n), Some(1)) => Ok(n),
        (Some(n), Some(m)) => Err(BvrError::ShapeMismatch(format!(
            "batch sizes {} and {} cannot be broadcast together", n, m
        ))),
        (None, None) => Ok(1),
    }
}
