//! Property-based tests for the rectangle post-processing stages.

use iconbox::{
    Pipeline, Rectangle, filter_nested_boxes, filter_small_boxes, merge_rectangles,
    merge_rectangles_capped,
};
use proptest::prelude::*;

fn arb_rect() -> impl Strategy<Value = Rectangle> {
    (-20i32..200, -20i32..200, 0u32..40, 0u32..40)
        .prop_map(|(x, y, w, h)| Rectangle::new(x, y, w, h))
}

fn arb_rects() -> impl Strategy<Value = Vec<Rectangle>> {
    prop::collection::vec(arb_rect(), 0..30)
}

fn sorted(mut rects: Vec<Rectangle>) -> Vec<Rectangle> {
    rects.sort();
    rects
}

proptest! {
    #[test]
    fn union_contains_both(a in arb_rect(), b in arb_rect()) {
        let u = a.union(&b);
        prop_assert!(u.contains(&a));
        prop_assert!(u.contains(&b));
        prop_assert_eq!(u, b.union(&a));
    }

    #[test]
    fn capped_merge_respects_cap(rects in arb_rects(), margin in 0u32..15, cap in 1u32..120) {
        let merged = merge_rectangles_capped(&rects, margin, Some(cap));
        for rect in &merged {
            // 超过上限的矩形只能是原样保留的输入
            prop_assert!(
                (rect.width <= cap && rect.height <= cap) || rects.contains(rect),
                "{:?} 超过上限 {}", rect, cap
            );
        }
        for r in &rects {
            prop_assert!(merged.iter().any(|m| m.contains(r)));
        }
    }

    #[test]
    fn overlap_is_symmetric(a in arb_rect(), b in arb_rect(), margin in 0u32..20) {
        prop_assert_eq!(a.overlaps(&b, margin), b.overlaps(&a, margin));
    }

    #[test]
    fn merge_output_has_no_overlapping_pair(rects in arb_rects(), margin in 0u32..15) {
        let merged = merge_rectangles(&rects, margin);
        for (i, a) in merged.iter().enumerate() {
            for b in &merged[i + 1..] {
                prop_assert!(!a.overlaps(b, margin), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn merge_is_idempotent(rects in arb_rects(), margin in 0u32..15) {
        let once = merge_rectangles(&rects, margin);
        let twice = merge_rectangles(&once, margin);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_covers_every_input(rects in arb_rects(), margin in 0u32..15) {
        let merged = merge_rectangles(&rects, margin);
        for r in &rects {
            prop_assert!(merged.iter().any(|m| m.contains(r)), "{:?} is not covered", r);
        }
        prop_assert!(merged.len() <= rects.len());
    }

    #[test]
    fn merge_partition_ignores_input_order(rects in arb_rects(), margin in 0u32..15) {
        let forward = merge_rectangles(&rects, margin);
        let reversed: Vec<_> = rects.iter().rev().copied().collect();
        let backward = merge_rectangles(&reversed, margin);
        prop_assert_eq!(sorted(forward), sorted(backward));
    }

    #[test]
    fn nested_filter_leaves_no_contained_box(rects in arb_rects()) {
        let kept = filter_nested_boxes(&rects);
        for (i, a) in kept.iter().enumerate() {
            for (j, b) in kept.iter().enumerate() {
                if i != j {
                    prop_assert!(!b.contains(a), "{:?} still inside {:?}", a, b);
                }
            }
        }
        // 每个被移除的矩形都必须被某个保留下来的矩形包含
        for r in &rects {
            prop_assert!(kept.iter().any(|k| k.contains(r)));
        }
    }

    #[test]
    fn size_filter_keeps_order_and_threshold(rects in arb_rects(), w in 0u32..20, h in 0u32..20) {
        let kept = filter_small_boxes(&rects, w, h);
        let expected: Vec<_> = rects.iter().filter(|r| r.width >= w && r.height >= h).copied().collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn pipeline_output_is_deterministic(rects in arb_rects()) {
        let pipeline = Pipeline::default();
        prop_assert_eq!(pipeline.run(&rects), pipeline.run(&rects));
    }
}
