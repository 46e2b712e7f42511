use iconbox::{Pipeline, Rectangle, merge_rectangles};
use std::time::{Duration, Instant};

/// 伪随机生成矩形，保证每次运行输入一致
fn scattered_rects(count: usize) -> Vec<Rectangle> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut next = move |bound: u64| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state % bound
    };
    (0..count)
        .map(|_| {
            Rectangle::new(
                next(1920) as i32,
                next(1080) as i32,
                next(40) as u32 + 1,
                next(40) as u32 + 1,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_performance() {
        let raw = scattered_rects(300);

        // 预热运行一次
        let expected = Pipeline::default().run(&raw);

        let iterations = 20;
        let mut total_duration = Duration::new(0, 0);
        let mut max_duration = Duration::new(0, 0);

        for _ in 0..iterations {
            let start = Instant::now();
            let bounds = Pipeline::default().run(&raw);
            let duration = start.elapsed();

            assert_eq!(bounds, expected);
            total_duration += duration;
            max_duration = max_duration.max(duration);
        }

        let average_duration = total_duration / iterations;
        println!("平均耗时: {:?}, 最大耗时: {:?}", average_duration, max_duration);

        // 几百个矩形的处理时间应当远小于1秒
        assert!(average_duration.as_millis() < 1000, "平均处理时间过长: {:?}", average_duration);
    }

    #[test]
    fn test_dense_cluster_converges() {
        // 紧密排列的网格最终应合并成一个矩形
        let grid: Vec<_> = (0..15)
            .flat_map(|row| (0..15).map(move |col| Rectangle::new(col * 12, row * 12, 10, 10)))
            .collect();

        let start = Instant::now();
        let merged = merge_rectangles(&grid, 3);
        println!("网格合并耗时: {:?}", start.elapsed());

        assert_eq!(merged, vec![Rectangle::new(0, 0, 178, 178)]);
    }
}
