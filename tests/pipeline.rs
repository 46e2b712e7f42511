use iconbox::{
    DetectError, Pipeline, Rectangle, filter_nested_boxes, filter_small_boxes, merge_rectangles,
};

fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(x, y, w, h)
}

#[test]
fn overlapping_pair_merges_into_one() {
    let merged = merge_rectangles(&[rect(0, 0, 10, 10), rect(8, 8, 10, 10)], 0);
    assert_eq!(merged, vec![rect(0, 0, 18, 18)]);
}

#[test]
fn distant_pair_stays_apart() {
    let input = [rect(0, 0, 10, 10), rect(100, 100, 10, 10)];
    let mut merged = merge_rectangles(&input, 5);
    merged.sort();
    assert_eq!(merged, input.to_vec());
}

#[test]
fn nested_box_is_dropped() {
    let kept = filter_nested_boxes(&[rect(0, 0, 20, 20), rect(5, 5, 5, 5)]);
    assert_eq!(kept, vec![rect(0, 0, 20, 20)]);
}

#[test]
fn small_box_is_dropped() {
    let kept = filter_small_boxes(&[rect(0, 0, 3, 3), rect(0, 0, 10, 10)], 5, 5);
    assert_eq!(kept, vec![rect(0, 0, 10, 10)]);
}

#[test]
fn empty_input_runs_cleanly() {
    let bounds = Pipeline::default().run(&[]);
    assert!(bounds.is_empty());
    assert_eq!(bounds.report().count, 0);
}

#[test]
fn icon_fragments_become_one_labeled_box() {
    // 一个图标的若干碎片、一个远处的独立图标，以及一个噪点
    let raw = [
        (40, 40, 6, 20),
        (50, 40, 6, 20),
        (44, 62, 10, 4),
        (200, 10, 30, 30),
        (400, 300, 2, 3),
    ];
    let bounds = Pipeline::default().run_raw(&raw).unwrap();

    let labeled: Vec<_> = bounds.labeled().map(|(i, r)| (i, *r)).collect();
    assert_eq!(
        labeled,
        vec![(0, rect(40, 40, 16, 26)), (1, rect(200, 10, 30, 30))]
    );
}

#[test]
fn duplicate_detections_collapse_to_one() {
    let raw = [rect(10, 10, 20, 20), rect(10, 10, 20, 20)];
    let bounds = Pipeline::new(0, 5, 5).run(&raw);
    assert_eq!(bounds.as_slice(), &[rect(10, 10, 20, 20)]);
}

#[test]
fn malformed_input_is_rejected_with_its_position() {
    let err = Pipeline::default()
        .run_raw(&[(0, 0, 1, 1), (0, 0, 1, 1), (3, 3, -2, 5)])
        .unwrap_err();
    match err {
        DetectError::InvalidRectangle { index, width, height, .. } => {
            assert_eq!((index, width, height), (2, -2, 5));
        }
        other => panic!("unexpected error: {other}"),
    }
}
