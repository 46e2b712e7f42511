use tracing::debug;

use crate::color::bounds::{Bounds, Rectangle};
use crate::color::merge::merge_rectangles_capped;
use crate::color::posts::{filter_nested_boxes, filter_small_boxes};
use crate::config::{
    DEFAULT_MERGE_MARGIN, DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH, DetectConfig, Thresholds,
};
use crate::error::Result;

/// 矩形后处理流水线
///
/// 固定按 合并 → 去嵌套 → 尺寸过滤 的顺序处理原始矩形。
/// 不保存任何跨调用的状态，同样的输入和参数总是得到同样的输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    merge_margin: u32,
    min_width: u32,
    min_height: u32,
    max_merge_size: Option<u32>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            merge_margin: DEFAULT_MERGE_MARGIN,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            max_merge_size: None,
        }
    }
}

/// 流水线各阶段的输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stages {
    pub merged: Vec<Rectangle>,
    pub unnested: Vec<Rectangle>,
    pub kept: Vec<Rectangle>,
}

impl Pipeline {
    pub fn new(merge_margin: u32, min_width: u32, min_height: u32) -> Self {
        Self {
            merge_margin,
            min_width,
            min_height,
            max_merge_size: None,
        }
    }

    pub fn from_config(config: &DetectConfig) -> Self {
        Self::new(config.merge_margin, config.min_width, config.min_height)
            .with_max_merge_size(config.max_merge_size)
    }

    pub fn from_thresholds(thresholds: &Thresholds) -> Self {
        Self::new(thresholds.merge_margin, thresholds.min_width, thresholds.min_height)
            .with_max_merge_size(thresholds.max_merge_size)
    }

    /// 设置合并边距
    pub fn with_merge_margin(mut self, margin: u32) -> Self {
        self.merge_margin = margin;
        self
    }

    /// 设置最小尺寸
    pub fn with_min_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    /// 设置合并结果的宽高上限
    pub fn with_max_merge_size(mut self, max_merge_size: Option<u32>) -> Self {
        self.max_merge_size = max_merge_size;
        self
    }

    pub fn merge_margin(&self) -> u32 {
        self.merge_margin
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    pub fn max_merge_size(&self) -> Option<u32> {
        self.max_merge_size
    }

    /// 处理一组原始矩形
    ///
    /// # 参数
    /// * `raw` - 形状提取器给出的矩形，顺序任意
    ///
    /// # 返回值
    /// 返回最终的区域集合，其中的顺序即区域编号
    pub fn run(&self, raw: &[Rectangle]) -> Bounds {
        Bounds::from(self.run_stages(raw).kept)
    }

    /// 处理一组原始矩形，并保留每个阶段的中间结果
    pub fn run_stages(&self, raw: &[Rectangle]) -> Stages {
        let merged = merge_rectangles_capped(raw, self.merge_margin, self.max_merge_size);
        let unnested = filter_nested_boxes(&merged);
        let kept = filter_small_boxes(&unnested, self.min_width, self.min_height);

        debug!(
            raw = raw.len(),
            merged = merged.len(),
            unnested = unnested.len(),
            kept = kept.len(),
            "矩形后处理完成"
        );
        Stages { merged, unnested, kept }
    }

    /// 处理上游给出的 `(x, y, w, h)` 元组
    ///
    /// # 错误处理
    /// 任一元组的宽或高为负数时返回Err，不做任何处理
    pub fn run_raw(&self, raw: &[(i32, i32, i32, i32)]) -> Result<Bounds> {
        let rects = raw
            .iter()
            .enumerate()
            .map(|(index, tuple)| Rectangle::from_raw(index, *tuple))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.run(&rects))
    }
}
