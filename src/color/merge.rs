//! 矩形合并模块
//!
//! 把彼此重叠或距离在边距内的矩形反复合并，直到集合不再变化。

use tracing::trace;

use crate::color::bounds::Rectangle;

/// 合并相互重叠（含边距）的矩形
///
/// 每一轮按顺序遍历尚未被吸收的矩形，用它不断吸收后面所有与之重叠的矩形；
/// 只要某一轮发生过吸收就再跑一轮，直到某一轮没有任何吸收为止。
/// 结果中任意两个矩形在给定边距下都不重叠。
///
/// # 参数
/// * `rects` - 原始矩形序列
/// * `margin` - 重叠判断时每个矩形向外扩展的像素数
///
/// # 返回值
/// 返回合并后的矩形列表，空输入返回空列表
pub fn merge_rectangles(rects: &[Rectangle], margin: u32) -> Vec<Rectangle> {
    merge_rectangles_capped(rects, margin, None)
}

/// 带尺寸上限的矩形合并
///
/// 只有合并结果的宽和高都不超过 `max_size` 时才执行合并，`None` 表示不限制。
/// 设置上限后，结果中仍可能存在重叠的矩形（它们合并后会超过上限）。
pub fn merge_rectangles_capped(rects: &[Rectangle], margin: u32, max_size: Option<u32>) -> Vec<Rectangle> {
    let mut merged = rects.to_vec();
    let mut passes = 0usize;

    loop {
        passes += 1;
        let (next, absorbed) = merge_pass(&merged, margin, max_size);
        merged = next;
        if absorbed == 0 {
            break;
        }
    }

    trace!(input = rects.len(), output = merged.len(), passes, "矩形合并完成");
    merged
}

/// 执行一轮合并，返回新的矩形列表和本轮吸收的矩形数量
fn merge_pass(rects: &[Rectangle], margin: u32, max_size: Option<u32>) -> (Vec<Rectangle>, usize) {
    let mut result = Vec::with_capacity(rects.len());
    let mut used = vec![false; rects.len()];
    let mut absorbed = 0;

    for i in 0..rects.len() {
        if used[i] {
            continue;
        }

        let mut current = rects[i];
        for j in (i + 1)..rects.len() {
            if used[j] {
                continue;
            }
            if !current.overlaps(&rects[j], margin) {
                continue;
            }
            let candidate = current.union(&rects[j]);
            if max_size.is_some_and(|max| candidate.width > max || candidate.height > max) {
                continue;
            }
            current = candidate;
            used[j] = true;
            absorbed += 1;
        }
        result.push(current);
    }

    (result, absorbed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_single() {
        assert!(merge_rectangles(&[], 10).is_empty());
        let one = Rectangle::new(4, 4, 2, 2);
        assert_eq!(merge_rectangles(&[one], 10), vec![one]);
    }

    #[test]
    fn overlapping_pair_is_merged() {
        let rects = [Rectangle::new(0, 0, 10, 10), Rectangle::new(8, 8, 10, 10)];
        assert_eq!(merge_rectangles(&rects, 0), vec![Rectangle::new(0, 0, 18, 18)]);
    }

    #[test]
    fn distant_pair_is_kept() {
        let rects = [Rectangle::new(0, 0, 10, 10), Rectangle::new(100, 100, 10, 10)];
        assert_eq!(merge_rectangles(&rects, 5), rects.to_vec());
    }

    #[test]
    fn growth_pulls_in_earlier_skipped_box() {
        // c 只与 a∪b 的结果重叠，需要第二轮才能被吸收
        let c = Rectangle::new(12, 0, 3, 3);
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(5, 5, 10, 10);
        assert!(!c.overlaps(&a, 0) && !c.overlaps(&b, 0));
        let merged = merge_rectangles(&[c, a, b], 0);
        assert_eq!(merged, vec![Rectangle::new(0, 0, 15, 15)]);
    }

    #[test]
    fn chain_collapses_to_one() {
        let rects: Vec<_> = (0..6).map(|i| Rectangle::new(i * 12, 0, 10, 10)).collect();
        assert_eq!(merge_rectangles(&rects, 3), vec![Rectangle::new(0, 0, 70, 10)]);
        assert_eq!(merge_rectangles(&rects, 2).len(), 6);
    }

    #[test]
    fn cap_blocks_oversized_unions() {
        let rects: Vec<_> = (0..6).map(|i| Rectangle::new(i * 12, 0, 10, 10)).collect();
        let capped = merge_rectangles_capped(&rects, 3, Some(34));
        assert_eq!(
            capped,
            vec![Rectangle::new(0, 0, 34, 10), Rectangle::new(36, 0, 34, 10)]
        );
        assert_eq!(merge_rectangles_capped(&rects, 3, None), merge_rectangles(&rects, 3));
    }

    #[test]
    fn cap_is_inclusive() {
        let rects = [Rectangle::new(0, 0, 10, 10), Rectangle::new(10, 0, 10, 10)];
        assert_eq!(merge_rectangles_capped(&rects, 1, Some(20)), vec![Rectangle::new(0, 0, 20, 10)]);
        assert_eq!(merge_rectangles_capped(&rects, 1, Some(19)), rects.to_vec());
    }
}
