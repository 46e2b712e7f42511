use serde::{Deserialize, Serialize};

use crate::color::posts::{BoxClass, ClassCounts};
use crate::error::{DetectError, Result};

/// 矩形边界框
///
/// 轴对齐的像素整数矩形，`(x, y)` 为左上角坐标。
/// 宽高使用无符号整数，保证任何阶段都不会出现负尺寸。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rectangle {
    /// 左上角x坐标
    pub x: i32,
    /// 左上角y坐标
    pub y: i32,
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
}

impl Rectangle {
    /// 创建一个新的矩形
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// 由上游提供的原始 `(x, y, w, h)` 元组创建矩形
    ///
    /// # 参数
    /// * `index` - 元组在输入序列中的位置，用于错误信息
    /// * `raw` - 原始元组
    ///
    /// # 错误处理
    /// 宽度或高度为负数时返回 `DetectError::InvalidRectangle`
    pub fn from_raw(index: usize, raw: (i32, i32, i32, i32)) -> Result<Self> {
        let (x, y, width, height) = raw;
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => Ok(Self::new(x, y, w, h)),
            _ => Err(DetectError::InvalidRectangle { index, x, y, width, height }),
        }
    }

    /// 右边界 `x + width`
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// 下边界 `y + height`
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// 计算矩形面积
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 判断两个矩形在各自向外扩展 `margin` 像素后是否相交
    ///
    /// 关系是对称的：`a.overlaps(&b, m) == b.overlaps(&a, m)`。
    pub fn overlaps(&self, other: &Rectangle, margin: u32) -> bool {
        let margin = margin as i64;
        (self.x as i64) < other.right() + margin
            && self.right() + margin > other.x as i64
            && (self.y as i64) < other.bottom() + margin
            && self.bottom() + margin > other.y as i64
    }

    /// 计算同时包含两个矩形的最小矩形
    ///
    /// 前提：合并后的跨度不超过 `u32::MAX`。像素坐标下总是成立，
    /// 跨度可能溢出时请使用 [`Rectangle::checked_union`]。
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let merged = self.checked_union(other);
        debug_assert!(merged.is_some(), "矩形跨度超出u32: {self:?} ∪ {other:?}");
        merged.unwrap_or_else(|| {
            let x = self.x.min(other.x);
            let y = self.y.min(other.y);
            Rectangle::new(x, y, u32::MAX, u32::MAX)
        })
    }

    /// 计算同时包含两个矩形的最小矩形，跨度超出 `u32` 时返回 `None`
    pub fn checked_union(&self, other: &Rectangle) -> Option<Rectangle> {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let width = self.right().max(other.right()) - x as i64;
        let height = self.bottom().max(other.bottom()) - y as i64;
        Some(Rectangle {
            x,
            y,
            width: u32::try_from(width).ok()?,
            height: u32::try_from(height).ok()?,
        })
    }

    /// 平移矩形，坐标饱和到 `i32` 范围
    pub fn translate(&self, dx: i32, dy: i32) -> Rectangle {
        Rectangle::new(self.x.saturating_add(dx), self.y.saturating_add(dy), self.width, self.height)
    }

    /// 判断 `inner` 是否完全位于当前矩形内（边界重合也算包含）
    pub fn contains(&self, inner: &Rectangle) -> bool {
        self.x <= inner.x
            && self.y <= inner.y
            && inner.right() <= self.right()
            && inner.bottom() <= self.bottom()
    }
}

impl From<Rectangle> for (i32, i32, u32, u32) {
    fn from(rect: Rectangle) -> Self {
        (rect.x, rect.y, rect.width, rect.height)
    }
}

/// 检测一帧得到的全部区域
///
/// 按输出顺序保存矩形，输出位置即为区域编号，供下游绘制和标注使用。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bounds {
    rects: Vec<Rectangle>,
}

impl Bounds {
    /// 创建一个新的空Bounds容器
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// 返回容器中区域的数量
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// 检查容器是否为空
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// 获取所有矩形的切片引用
    pub fn as_slice(&self) -> &[Rectangle] {
        &self.rects
    }

    /// 根据编号获取矩形
    pub fn get(&self, index: usize) -> Option<&Rectangle> {
        self.rects.get(index)
    }

    pub fn first(&self) -> Option<&Rectangle> {
        self.rects.first()
    }

    pub fn last(&self) -> Option<&Rectangle> {
        self.rects.last()
    }

    /// 提供只读迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, Rectangle> {
        self.rects.iter()
    }

    /// 按输出顺序给每个矩形分配编号
    pub fn labeled(&self) -> impl Iterator<Item = (usize, &Rectangle)> + '_ {
        self.rects.iter().enumerate()
    }

    /// 生成可序列化的检测报告
    pub fn report(&self) -> Report {
        Report {
            count: self.len(),
            boxes: self
                .labeled()
                .map(|(index, rect)| LabeledBox { index, rect: *rect })
                .collect(),
            classes: None,
        }
    }

    pub fn into_vec(self) -> Vec<Rectangle> {
        self.rects
    }
}

impl From<Vec<Rectangle>> for Bounds {
    fn from(rects: Vec<Rectangle>) -> Self {
        Self { rects }
    }
}

impl<'a> IntoIterator for &'a Bounds {
    type Item = &'a Rectangle;
    type IntoIter = std::slice::Iter<'a, Rectangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}

impl IntoIterator for Bounds {
    type Item = Rectangle;
    type IntoIter = std::vec::IntoIter<Rectangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.into_iter()
    }
}

/// 带编号的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledBox {
    pub index: usize,
    #[serde(flatten)]
    pub rect: Rectangle,
}

/// 检测报告：区域数量及每个区域的编号和坐标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub count: usize,
    pub boxes: Vec<LabeledBox>,
    /// 分类统计，只有经过分类的检测结果才会带上
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<ClassCounts>,
}

/// 带分类结果的区域
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedBox {
    /// 去嵌套后的区域
    pub rect: Rectangle,
    /// 区域内目标颜色像素的紧致外接矩形，没有命中像素时与 `rect` 相同
    pub tight: Rectangle,
    /// 紧致矩形内目标颜色像素的百分比
    pub coverage: f64,
    pub class: BoxClass,
}

/// 一次完整检测的结果
///
/// `bounds` 是经过尺寸过滤的最终区域，`boxes` 是去嵌套后尚未做尺寸过滤的全部区域及其分类。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub bounds: Bounds,
    pub boxes: Vec<ClassifiedBox>,
    pub counts: ClassCounts,
}

impl Detection {
    /// 生成带分类统计的检测报告
    pub fn report(&self) -> Report {
        Report {
            classes: Some(self.counts),
            ..self.bounds.report()
        }
    }

    /// 指定类别的区域
    pub fn of_class(&self, class: BoxClass) -> impl Iterator<Item = &ClassifiedBox> + '_ {
        self.boxes.iter().filter(move |b| b.class == class)
    }
}
