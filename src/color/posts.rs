//! 边界框后处理模块
//!
//! 负责对合并后的矩形做去嵌套、尺寸过滤，以及按尺寸、宽高比和颜色占比给区域分类。

use serde::{Deserialize, Serialize};

use crate::color::bounds::Rectangle;
use crate::config::{
    DEFAULT_ALLOWED_PROPORTION, DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH, DEFAULT_NOISE_PERCENTAGE,
    DEFAULT_PLAIN_PERCENTAGE,
};

/// 去除完全嵌套在其他矩形内部的矩形
///
/// 一个矩形只要被另一个不同位置的矩形完全包含（边界重合也算），就会被移除。
/// 对于边界完全相同的多个副本，保留下标最小的那个，其余副本移除。
/// 保留下来的矩形维持原有的相对顺序。
///
/// # 参数
/// * `rects` - 矩形序列
///
/// # 返回值
/// 返回不包含嵌套矩形的列表
pub fn filter_nested_boxes(rects: &[Rectangle]) -> Vec<Rectangle> {
    rects
        .iter()
        .enumerate()
        .filter(|&(i, rect)| !is_nested(rects, i, rect))
        .map(|(_, rect)| *rect)
        .collect()
}

fn is_nested(rects: &[Rectangle], index: usize, rect: &Rectangle) -> bool {
    rects.iter().enumerate().any(|(j, other)| {
        if j == index || !other.contains(rect) {
            return false;
        }
        // 相同边界互相包含，只让前面的副本淘汰后面的
        other != rect || j < index
    })
}

/// 去除尺寸过小的矩形
///
/// 保留宽度不小于 `min_width` 且高度不小于 `min_height` 的矩形，顺序不变。
pub fn filter_small_boxes(rects: &[Rectangle], min_width: u32, min_height: u32) -> Vec<Rectangle> {
    rects
        .iter()
        .filter(|rect| rect.width >= min_width && rect.height >= min_height)
        .copied()
        .collect()
}

/// 去除尺寸过大的矩形
///
/// 保留宽度严格小于 `max_width` 且高度严格小于 `max_height` 的矩形，顺序不变。
pub fn filter_big_boxes(rects: &[Rectangle], max_width: u32, max_height: u32) -> Vec<Rectangle> {
    rects
        .iter()
        .filter(|rect| rect.width < max_width && rect.height < max_height)
        .copied()
        .collect()
}

/// 宽或高小于下限
pub fn is_small_box(rect: &Rectangle, min_width: u32, min_height: u32) -> bool {
    rect.width < min_width || rect.height < min_height
}

/// 宽或高超过上限，`None` 表示不限制
pub fn is_big_box(rect: &Rectangle, max_width: Option<u32>, max_height: Option<u32>) -> bool {
    max_width.is_some_and(|max| rect.width > max) || max_height.is_some_and(|max| rect.height > max)
}

/// 宽高比或高宽比超过 `allowed`
///
/// 零尺寸的一边视为无穷大的比例；宽高都为零时不算异常。
pub fn is_abnormal_proportion(rect: &Rectangle, allowed: f64) -> bool {
    let (w, h) = (rect.width as f64, rect.height as f64);
    w / h > allowed || h / w > allowed
}

/// 区域类别
///
/// 声明顺序即判定优先级：先命中的类别生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxClass {
    /// 宽高比异常
    Abnormal,
    /// 几乎全是目标颜色的纯色块
    Plain,
    Small,
    Big,
    /// 目标颜色像素过少
    Noisy,
    Success,
}

impl BoxClass {
    pub fn name(&self) -> &'static str {
        match self {
            BoxClass::Abnormal => "abnormal",
            BoxClass::Plain => "plain",
            BoxClass::Small => "small",
            BoxClass::Big => "big",
            BoxClass::Noisy => "noisy",
            BoxClass::Success => "success",
        }
    }
}

/// 各类别的区域数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub success: usize,
    pub plain: usize,
    pub small: usize,
    pub big: usize,
    pub noisy: usize,
    pub abnormal: usize,
}

impl ClassCounts {
    pub fn record(&mut self, class: BoxClass) {
        *self.slot(class) += 1;
    }

    pub fn get(&self, class: BoxClass) -> usize {
        match class {
            BoxClass::Abnormal => self.abnormal,
            BoxClass::Plain => self.plain,
            BoxClass::Small => self.small,
            BoxClass::Big => self.big,
            BoxClass::Noisy => self.noisy,
            BoxClass::Success => self.success,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.plain + self.small + self.big + self.noisy + self.abnormal
    }

    fn slot(&mut self, class: BoxClass) -> &mut usize {
        match class {
            BoxClass::Abnormal => &mut self.abnormal,
            BoxClass::Plain => &mut self.plain,
            BoxClass::Small => &mut self.small,
            BoxClass::Big => &mut self.big,
            BoxClass::Noisy => &mut self.noisy,
            BoxClass::Success => &mut self.success,
        }
    }
}

impl FromIterator<BoxClass> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = BoxClass>>(iter: I) -> Self {
        let mut counts = ClassCounts::default();
        for class in iter {
            counts.record(class);
        }
        counts
    }
}

/// 区域分类规则
///
/// 判定顺序：宽高比异常 → 纯色块 → 过小 → 过大 → 噪声 → 正常。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyRules {
    pub min_width: u32,
    pub min_height: u32,
    /// `None` 表示不限制
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// 允许的最大宽高比（双向）
    pub allowed_proportion: f64,
    /// 颜色占比低于该百分比视为噪声
    pub noise_percentage: f64,
    /// 颜色占比高于该百分比视为纯色块
    pub plain_percentage: f64,
}

impl Default for ClassifyRules {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            max_width: None,
            max_height: None,
            allowed_proportion: DEFAULT_ALLOWED_PROPORTION,
            noise_percentage: DEFAULT_NOISE_PERCENTAGE,
            plain_percentage: DEFAULT_PLAIN_PERCENTAGE,
        }
    }
}

impl ClassifyRules {
    /// 对一个区域分类
    ///
    /// # 参数
    /// * `rect` - 目标颜色像素的紧致外接矩形
    /// * `coverage` - 该矩形内目标颜色像素的百分比 (0 - 100)
    pub fn classify(&self, rect: &Rectangle, coverage: f64) -> BoxClass {
        if is_abnormal_proportion(rect, self.allowed_proportion) {
            BoxClass::Abnormal
        } else if coverage > self.plain_percentage {
            BoxClass::Plain
        } else if is_small_box(rect, self.min_width, self.min_height) {
            BoxClass::Small
        } else if is_big_box(rect, self.max_width, self.max_height) {
            BoxClass::Big
        } else if coverage < self.noise_percentage {
            BoxClass::Noisy
        } else {
            BoxClass::Success
        }
    }
}
