extern crate bvr_vision;

use ndarray::{array, s, Array2, Array3, Axis};
use bvr_vision::data::{DecoderConfig, SENTINEL_CLASS};
use bvr_vision::{decode_predictions, BvrError, MultiClassNms};

fn boxes() -> Array2<f32> {
    array![
        [0., 0., 10., 10.],
        [1., 1., 11., 11.],
        [50., 50., 60., 60.],
        [0., 0., 10., 10.],
    ]
}

fn scores() -> Array2<f32> {
    array![
        [0.9, 0.0],
        [0.8, 0.0],
        [0.1, 0.7],
        [0.0, 0.6],
    ]
}

fn batch_of(boxes: Array2<f32>, scores: Array2<f32>) -> (Array3<f32>, Array3<f32>) {
    let empty_scores = Array2::<f32>::zeros(scores.raw_dim());
    let box_batch = ndarray::stack(Axis(0), &[boxes.view(), boxes.view()]).unwrap();
    let score_batch = ndarray::stack(Axis(0), &[scores.view(), empty_scores.view()]).unwrap();
    (box_batch, score_batch)
}

fn decoder(max_detections: usize) -> MultiClassNms {
    MultiClassNms::new(DecoderConfig::new().with_max_detections(max_detections)).unwrap()
}

#[test]
fn output_is_padded_to_max_detections() {
    let (boxes, scores) = batch_of(boxes(), scores());

    let result = decoder(10).decode(boxes.view(), scores.view()).unwrap();

    assert_eq!(result.boxes.shape(), &[2, 10, 4]);
    assert_eq!(result.classes.shape(), &[2, 10]);
    assert_eq!(result.confidence.shape(), &[2, 10]);
    assert_eq!(result.num_detections(), vec![4, 0]);

    // padding slots
    assert!(result.classes.slice(s![0, 4..]).iter().all(|&c| c == SENTINEL_CLASS));
    assert!(result.confidence.slice(s![0, 4..]).iter().all(|&c| c == 0.));
    assert!(result.boxes.slice(s![0, 4.., ..]).iter().all(|&v| v == 0.));
    assert!(result.classes.row(1).iter().all(|&c| c == SENTINEL_CLASS));
}

#[test]
fn suppresses_per_class_and_merges_by_score() {
    let result = decoder(10).decode_unbatched(boxes().view(), scores().view()).unwrap();

    assert_eq!(result.classes.slice(s![..4]).to_vec(), vec![0, 1, 1, 0]);
    assert_eq!(result.confidence.slice(s![..4]).to_vec(), vec![0.9, 0.7, 0.6, 0.1]);
    assert_eq!(result.boxes.row(0).to_vec(), vec![0., 0., 10., 10.]);
    assert_eq!(result.boxes.row(1).to_vec(), vec![50., 50., 60., 60.]);
    assert_eq!(result.boxes.row(2).to_vec(), vec![0., 0., 10., 10.]);
    assert_eq!(result.boxes.row(3).to_vec(), vec![50., 50., 60., 60.]);
}

#[test]
fn max_detections_keeps_highest_scores() {
    let result = decoder(2).decode_unbatched(boxes().view(), scores().view()).unwrap();

    assert_eq!(result.num_detections(), 2);
    assert_eq!(result.confidence.to_vec(), vec![0.9, 0.7]);
}

#[test]
fn decoding_is_deterministic() {
    let (boxes, scores) = batch_of(boxes(), scores());
    let decoder = decoder(10);

    let first = decoder.decode(boxes.view(), scores.view()).unwrap();
    let second = decoder.decode(boxes.view(), scores.view()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn decoding_own_output_is_idempotent() {
    let decoder = decoder(10);
    let first = decoder.decode_unbatched(boxes().view(), scores().view()).unwrap();

    let (boxes, scores) = first.to_predictions(2);
    let second = decoder.decode_unbatched(boxes.view(), scores.view()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn confidence_threshold_is_strict() {
    let boxes = array![[0., 0., 10., 10.], [20., 20., 30., 30.]];
    let scores = array![[0.5], [0.6]];
    let decoder = MultiClassNms::new(DecoderConfig::new().with_confidence(0.5).with_max_detections(5)).unwrap();

    let result = decoder.decode_unbatched(boxes.view(), scores.view()).unwrap();

    assert_eq!(result.num_detections(), 1);
    assert_eq!(result.confidence[0], 0.6);
}

#[test]
fn equal_scores_keep_lower_index() {
    let boxes = array![[0., 0., 10., 10.], [0., 0., 10., 9.9]];
    let scores = array![[0.5], [0.5]];

    let result = decoder(5).decode_unbatched(boxes.view(), scores.view()).unwrap();

    assert_eq!(result.num_detections(), 1);
    assert_eq!(result.boxes.row(0).to_vec(), vec![0., 0., 10., 10.]);
}

#[test]
fn per_class_cap() {
    let boxes = array![[0., 0., 10., 10.], [20., 20., 30., 30.], [40., 40., 50., 50.]];
    let scores = array![[0.9], [0.8], [0.7]];
    let config = DecoderConfig::new().with_max_detections(5).with_max_detections_per_class(Some(2));

    let result = MultiClassNms::new(config).unwrap().decode_unbatched(boxes.view(), scores.view()).unwrap();

    assert_eq!(result.num_detections(), 2);
    assert_eq!(result.confidence.slice(s![..2]).to_vec(), vec![0.9, 0.8]);
}

#[test]
fn logits_go_through_sigmoid() {
    let boxes = array![[0., 0., 10., 10.], [20., 20., 30., 30.]];
    let scores = array![[0.0], [-10.0]];
    let config = DecoderConfig::new().with_from_logits(true).with_max_detections(5);

    let result = MultiClassNms::new(config).unwrap().decode_unbatched(boxes.view(), scores.view()).unwrap();

    assert_eq!(result.num_detections(), 1);
    assert_eq!(result.confidence[0], 0.5);
}

#[test]
fn boxes_come_back_in_declared_format() {
    let boxes = array![[0., 0., 10., 10.], [1., 1., 10., 10.]];
    let scores = array![[0.9], [0.8]];
    let config = DecoderConfig::new().with_bounding_box_format("xywh").with_max_detections(5);

    let result = MultiClassNms::new(config).unwrap().decode_unbatched(boxes.view(), scores.view()).unwrap();

    // second box overlaps the first once read as xywh
    assert_eq!(result.num_detections(), 1);
    assert_eq!(result.boxes.row(0).to_vec(), vec![0., 0., 10., 10.]);
}

#[test]
fn no_candidates_gives_all_padding() {
    let boxes = Array2::<f32>::zeros((3, 4));
    let scores = Array2::<f32>::zeros((3, 4));

    let result = decoder(4).decode_unbatched(boxes.view(), scores.view()).unwrap();

    assert_eq!(result.num_detections(), 0);
    assert!(result.detections().is_empty());
    assert_eq!(result.classes.to_vec(), vec![SENTINEL_CLASS; 4]);
}

#[test]
fn ragged_view_drops_padding() {
    let (boxes, scores) = batch_of(boxes(), scores());

    let result = decode_predictions(boxes.view(), scores.view(), &DecoderConfig::new().with_max_detections(10)).unwrap();
    let ragged = result.to_ragged();

    assert_eq!(ragged.len(), 2);
    assert_eq!(ragged.row_lengths(), vec![4, 0]);
    let first = ragged.row(0).unwrap();
    assert_eq!(first[0].class_id, 0);
    assert_eq!(first[0].bbox, [0., 0., 10., 10.]);
    assert!(first.iter().all(|d| !d.is_sentinel()));
}

#[test]
fn invalid_config_is_rejected() {
    let err = MultiClassNms::new(DecoderConfig::new().with_iou(1.5)).unwrap_err();
    assert!(matches!(err, BvrError::InvalidConfig(_)));

    let err = MultiClassNms::new(DecoderConfig::new().with_bounding_box_format("boxes")).unwrap_err();
    assert!(matches!(err, BvrError::InvalidEncoding(_)));
}

#[test]
fn shape_errors() {
    let decoder = MultiClassNms::new(DecoderConfig::new().with_nc(3)).unwrap();

    let err = decoder.decode_unbatched(boxes().view(), scores().view()).unwrap_err();
    assert!(matches!(err, BvrError::ShapeMismatch(_)));

    let err = decoder.decode_unbatched(Array2::<f32>::zeros((4, 5)).view(), Array2::<f32>::zeros((4, 3)).view()).unwrap_err();
    assert!(matches!(err, BvrError::ShapeMismatch(_)));

    let err = decoder.decode_unbatched(Array2::<f32>::zeros((4, 4)).view(), Array2::<f32>::zeros((5, 3)).view()).unwrap_err();
    assert!(matches!(err, BvrError::ShapeMismatch(_)));

    let err = decoder
        .decode(Array3::<f32>::zeros((2, 4, 4)).view(), Array3::<f32>::zeros((3, 4, 3)).view())
        .unwrap_err();
    assert!(matches!(err, BvrError::ShapeMismatch(_)));
}
