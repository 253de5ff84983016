use std::cmp::Ordering;

pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
    /// Position in the original candidate list, used to break score ties.
    fn index(&self) -> usize;
}

/// Orders by descending confidence, then ascending original index.
pub fn confidence_order<T: Nms>(b1: &T, b2: &T) -> Ordering {
    b2.confidence()
        .total_cmp(&b1.confidence())
        .then_with(|| b1.index().cmp(&b2.index()))
}

/// Greedy non-max suppression in place.
///
/// Keeps the best remaining box, drops every later box whose IoU with a kept box is above
/// `iou_threshold`, and stops once `max_output` boxes are kept.
pub fn nms<T: Nms>(boxes: &mut Vec<T>, iou_threshold: f32, max_output: Option<usize>) {
    boxes.sort_by(confidence_order);
    let limit = max_output.unwrap_or(usize::MAX);

    let mut current_index = 0;
    for index in 0..boxes.len() {
        if current_index >= limit {
            break;
        }
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = boxes[prev_index].iou(&boxes[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::BvrBox;

    #[derive(Debug, Clone)]
    struct Scored(BvrBox, f32, usize);

    impl Nms for Scored {
        fn iou(&self, other: &Self) -> f32 {
            self.0.iou(&other.0)
        }

        fn confidence(&self) -> f32 {
            self.1
        }

        fn index(&self) -> usize {
            self.2
        }
    }

    fn indices(boxes: &[Scored]) -> Vec<usize> {
        boxes.iter().map(|b| b.2).collect()
    }

    #[test]
    fn suppresses_overlapping_lower_scores() {
        let mut boxes = vec![
            Scored(BvrBox::new(0., 0., 10., 10.), 0.8, 0),
            Scored(BvrBox::new(1., 1., 11., 11.), 0.9, 1),
            Scored(BvrBox::new(50., 50., 60., 60.), 0.7, 2),
        ];
        nms(&mut boxes, 0.5, None);
        assert_eq!(indices(&boxes), vec![1, 2]);
    }

    #[test]
    fn ties_keep_lower_index() {
        let mut boxes = vec![
            Scored(BvrBox::new(0., 0., 10., 10.), 0.5, 3),
            Scored(BvrBox::new(0., 0., 10., 10.), 0.5, 1),
        ];
        nms(&mut boxes, 0.5, None);
        assert_eq!(indices(&boxes), vec![1]);
    }

    #[test]
    fn iou_equal_to_threshold_is_kept() {
        // IoU of these two is exactly 0.5
        let mut boxes = vec![
            Scored(BvrBox::new(0., 0., 10., 20.), 0.9, 0),
            Scored(BvrBox::new(0., 0., 10., 10.), 0.8, 1),
        ];
        nms(&mut boxes, 0.5, None);
        assert_eq!(indices(&boxes), vec![0, 1]);
    }

    #[test]
    fn stops_at_max_output() {
        let mut boxes: Vec<Scored> = (0..5)
            .map(|i| Scored(BvrBox::new(0., i as f32 * 20., 10., i as f32 * 20. + 10.), 1. - i as f32 * 0.1, i))
            .collect();
        nms(&mut boxes, 0.5, Some(2));
        assert_eq!(indices(&boxes), vec![0, 1]);
    }
}
