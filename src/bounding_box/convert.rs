use ndarray::{Array2, ArrayView2, Zip};

use crate::common::{check_last_dim, BoxFormat, BvrBox};
use crate::error::BvrError;
use crate::Result;

/// Converts `(num_boxes, 4)` rows from `source` to `target` format.
///
/// `image_shape` is `(height, width)` and is required whenever exactly one side is relative.
pub fn convert_format(boxes: ArrayView2<f32>, source: &str, target: &str,
                      image_shape: Option<(f32, f32)>) -> Result<Array2<f32>> {
    let source = BoxFormat::from_str(source)?;
    let target = BoxFormat::from_str(target)?;
    convert_box_format(boxes, source, target, image_shape)
}

pub fn convert_box_format(boxes: ArrayView2<f32>, source: BoxFormat, target: BoxFormat,
                          image_shape: Option<(f32, f32)>) -> Result<Array2<f32>> {
    check_last_dim(boxes.shape())?;
    if source == target {
        return Ok(boxes.to_owned());
    }

    // relative <-> relative only re-arranges, the scale cancels out
    let (sy, sx) = match (source.is_relative(), target.is_relative()) {
        (false, false) | (true, true) => (1., 1.),
        (true, false) | (false, true) => {
            let (height, width) = image_shape.ok_or_else(|| BvrError::InvalidConfig(format!(
                "converting `{}` to `{}` requires an image shape", source, target
            )))?;
            if height <= 0. || width <= 0. {
                return Err(BvrError::InvalidConfig(format!(
                    "image shape must be positive, got ({}, {})", height, width
                )));
            }
            (height, width)
        }
    };
    let to_relative = target.is_relative() && !source.is_relative();

    let mut converted = Array2::<f32>::zeros((boxes.nrows(), 4));
    Zip::from(converted.rows_mut())
        .and(boxes.rows())
        .for_each(|mut out, row| {
            let bbox = BvrBox::from_row([row[0], row[1], row[2], row[3]], source);
            let bbox = if to_relative { bbox.unscale(sy, sx) } else { bbox.scale(sy, sx) };
            let [a, b, c, d] = bbox.to_row(target);
            out[0] = a;
            out[1] = b;
            out[2] = c;
            out[3] = d;
        });

    Ok(converted)
}

/// Rows as canonical corner boxes, without any relative-to-absolute scaling.
pub(crate) fn to_canonical(boxes: ArrayView2<f32>, format: BoxFormat) -> Vec<BvrBox> {
    boxes
        .rows()
        .into_iter()
        .map(|row| BvrBox::from_row([row[0], row[1], row[2], row[3]], format))
        .collect()
}
