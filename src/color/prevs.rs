//! 颜色预处理模块
//!
//! 把RGB图像转换成数组，并按目标颜色和容差生成二值掩码。

use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array2, Array3, Axis, Zip, s};

use crate::color::bounds::Rectangle;
use crate::config::TargetColor;
use crate::error::Result;

/// 掩码中命中像素的取值
pub const MASK_HIT: u8 = 255;
/// 掩码中未命中像素的取值
pub const MASK_MISS: u8 = 0;

/// 目标颜色的取值范围
///
/// 每个通道的范围为 `[target - tolerance, target + tolerance]`，
/// 并截断到 `[0, 255]`，两端都包含在内。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRange {
    lower: [u8; 3],
    upper: [u8; 3],
}

impl ColorRange {
    pub fn new(target: TargetColor, tolerance: u8) -> Self {
        let channels = target.channels();
        Self {
            lower: channels.map(|c| c.saturating_sub(tolerance)),
            upper: channels.map(|c| c.saturating_add(tolerance)),
        }
    }

    pub fn lower(&self) -> [u8; 3] {
        self.lower
    }

    pub fn upper(&self) -> [u8; 3] {
        self.upper
    }

    /// 判断像素是否落在范围内
    pub fn contains(&self, pixel: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= pixel[c] && pixel[c] <= self.upper[c])
    }
}

/// 将图像转换为 `(height, width, 3)` 形状的数组
///
/// # 参数
/// * `img` - RGB图像
///
/// # 返回值
/// 返回按行存储的三维数组，通道顺序为RGB
pub fn image_to_array(img: &RgbImage) -> Result<Array3<u8>> {
    let (width, height) = img.dimensions();
    let array = Array3::from_shape_vec((height as usize, width as usize, 3), img.as_raw().clone())?;
    Ok(array)
}

/// 生成颜色掩码
///
/// 并行遍历所有像素，落在颜色范围内的位置置为 `MASK_HIT`，其余为 `MASK_MISS`。
///
/// # 参数
/// * `pixels` - `image_to_array` 得到的数组
/// * `range` - 颜色范围
///
/// # 返回值
/// 返回形状为 `(height, width)` 的二维掩码
pub fn color_mask(pixels: &Array3<u8>, range: &ColorRange) -> Array2<u8> {
    let (height, width, _) = pixels.dim();
    let mut mask = Array2::from_elem((height, width), MASK_MISS);

    Zip::from(&mut mask)
        .and(pixels.lanes(Axis(2)))
        .par_for_each(|hit, pixel| {
            if range.contains([pixel[0], pixel[1], pixel[2]]) {
                *hit = MASK_HIT;
            }
        });

    mask
}

/// 将二维掩码转换为灰度图像
pub fn mask_to_image(mask: &Array2<u8>) -> GrayImage {
    let (height, width) = mask.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([mask[[y as usize, x as usize]]])
    })
}

/// 区域内目标颜色的分布
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    /// 命中像素的紧致外接矩形，区域内没有命中像素时为 `None`
    pub tight: Option<Rectangle>,
    /// 紧致矩形内命中像素的百分比 (0 - 100)
    pub percentage: f64,
}

/// 统计矩形区域内的掩码命中情况
///
/// 矩形先截断到掩码范围内，再求命中像素的紧致外接矩形，
/// 百分比按紧致矩形的面积计算。
pub fn box_coverage(mask: &Array2<u8>, rect: &Rectangle) -> Coverage {
    let (height, width) = mask.dim();
    let clamp = |v: i64, max: usize| v.clamp(0, max as i64) as usize;
    let (x0, x1) = (clamp(rect.x as i64, width), clamp(rect.right(), width));
    let (y0, y1) = (clamp(rect.y as i64, height), clamp(rect.bottom(), height));

    let mut hits = 0usize;
    // (min_x, min_y, max_x, max_y)
    let mut extent: Option<(usize, usize, usize, usize)> = None;
    if x0 < x1 && y0 < y1 {
        for ((row, col), &value) in mask.slice(s![y0..y1, x0..x1]).indexed_iter() {
            if value != MASK_HIT {
                continue;
            }
            hits += 1;
            extent = Some(match extent {
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(col), min_y.min(row), max_x.max(col), max_y.max(row))
                }
                None => (col, row, col, row),
            });
        }
    }

    match extent {
        Some((min_x, min_y, max_x, max_y)) => {
            let tight = Rectangle::new(
                (x0 + min_x) as i32,
                (y0 + min_y) as i32,
                (max_x - min_x + 1) as u32,
                (max_y - min_y + 1) as u32,
            );
            Coverage {
                tight: Some(tight),
                percentage: hits as f64 * 100.0 / tight.area() as f64,
            }
        }
        None => Coverage { tight: None, percentage: 0.0 },
    }
}
