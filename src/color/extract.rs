//! 形状提取模块
//!
//! 从图像中找出目标颜色的连通区域，并给出每个区域的外接矩形。

use std::collections::HashMap;

use image::{Luma, RgbImage};
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::Array2;
use tracing::debug;

use crate::color::bounds::Rectangle;
use crate::color::prevs::{ColorRange, MASK_MISS, color_mask, image_to_array, mask_to_image};
use crate::error::Result;

/// 形状提取器
///
/// 输入一张图像，输出若干轴对齐的原始矩形，顺序任意。
pub trait ShapeExtractor {
    fn extract(&self, image: &RgbImage) -> Result<Vec<Rectangle>>;
}

/// 基于颜色掩码和连通域标记的形状提取器
#[derive(Debug, Clone, Copy)]
pub struct ComponentExtractor {
    range: ColorRange,
    connectivity: Connectivity,
    padding: u32,
}

impl ComponentExtractor {
    /// 创建提取器，默认使用八连通，不外扩
    pub fn new(range: ColorRange) -> Self {
        Self {
            range,
            connectivity: Connectivity::Eight,
            padding: 0,
        }
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// 设置每个外接矩形向四周扩展的像素数，扩展结果截断在图像内
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn range(&self) -> &ColorRange {
        &self.range
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    /// 生成图像的颜色掩码
    pub fn mask(&self, image: &RgbImage) -> Result<Array2<u8>> {
        let pixels = image_to_array(image)?;
        Ok(color_mask(&pixels, &self.range))
    }

    /// 从掩码中提取所有连通区域的外接矩形
    ///
    /// 矩形按每个区域第一个像素的光栅扫描顺序排列，结果是确定的。
    pub fn boxes(&self, mask: &Array2<u8>) -> Vec<Rectangle> {
        let (height, width) = mask.dim();
        let labeled = connected_components(&mask_to_image(mask), self.connectivity, Luma([MASK_MISS]));

        let mut slots: HashMap<u32, usize> = HashMap::new();
        // (min_x, min_y, max_x, max_y)
        let mut extents: Vec<(u32, u32, u32, u32)> = Vec::new();

        for (x, y, label) in labeled.enumerate_pixels() {
            let label = label[0];
            if label == 0 {
                continue;
            }
            match slots.get(&label) {
                Some(&slot) => {
                    let e = &mut extents[slot];
                    e.0 = e.0.min(x);
                    e.1 = e.1.min(y);
                    e.2 = e.2.max(x);
                    e.3 = e.3.max(y);
                }
                None => {
                    slots.insert(label, extents.len());
                    extents.push((x, y, x, y));
                }
            }
        }

        debug!(components = extents.len(), padding = self.padding, "连通区域提取完成");

        let (width, height) = (width as u32, height as u32);
        extents
            .into_iter()
            .map(|(min_x, min_y, max_x, max_y)| {
                let x = min_x.saturating_sub(self.padding);
                let y = min_y.saturating_sub(self.padding);
                let w = (max_x - min_x + 1).saturating_add(self.padding.saturating_mul(2));
                let h = (max_y - min_y + 1).saturating_add(self.padding.saturating_mul(2));
                Rectangle::new(x as i32, y as i32, w.min(width - x), h.min(height - y))
            })
            .collect()
    }
}

impl ShapeExtractor for ComponentExtractor {
    fn extract(&self, image: &RgbImage) -> Result<Vec<Rectangle>> {
        Ok(self.boxes(&self.mask(image)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetColor;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn fill(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, color);
            }
        }
    }

    fn red_extractor() -> ComponentExtractor {
        ComponentExtractor::new(ColorRange::new(TargetColor::new(255, 0, 0), 20))
    }

    #[test]
    fn blank_image_has_no_shapes() {
        let img = RgbImage::new(16, 16);
        assert!(red_extractor().extract(&img).unwrap().is_empty());
    }

    #[test]
    fn each_blob_gets_its_bounding_box() {
        let mut img = RgbImage::new(40, 30);
        fill(&mut img, 20, 2, 4, 3, RED);
        fill(&mut img, 1, 10, 6, 5, RED);

        let rects = red_extractor().extract(&img).unwrap();
        assert_eq!(rects, vec![Rectangle::new(20, 2, 4, 3), Rectangle::new(1, 10, 6, 5)]);
    }

    #[test]
    fn diagonal_pixels_join_only_with_eight_connectivity() {
        let mut img = RgbImage::new(8, 8);
        img.put_pixel(2, 2, RED);
        img.put_pixel(3, 3, RED);

        let eight = red_extractor().extract(&img).unwrap();
        assert_eq!(eight, vec![Rectangle::new(2, 2, 2, 2)]);

        let four = red_extractor()
            .with_connectivity(Connectivity::Four)
            .extract(&img)
            .unwrap();
        assert_eq!(four, vec![Rectangle::new(2, 2, 1, 1), Rectangle::new(3, 3, 1, 1)]);
    }

    #[test]
    fn out_of_tolerance_pixels_are_ignored() {
        let mut img = RgbImage::new(10, 10);
        fill(&mut img, 0, 0, 3, 3, Rgb([240, 10, 10]));
        fill(&mut img, 5, 5, 3, 3, Rgb([200, 0, 0]));

        let rects = red_extractor().extract(&img).unwrap();
        assert_eq!(rects, vec![Rectangle::new(0, 0, 3, 3)]);
    }

    #[test]
    fn padding_grows_boxes_within_image() {
        let mut img = RgbImage::new(20, 20);
        fill(&mut img, 8, 8, 4, 4, RED);
        fill(&mut img, 0, 17, 3, 3, RED);

        let rects = red_extractor().with_padding(2).extract(&img).unwrap();
        assert_eq!(rects, vec![Rectangle::new(6, 6, 8, 8), Rectangle::new(0, 15, 7, 5)]);
    }

    #[test]
    fn mask_and_boxes_compose_to_extract() {
        let mut img = RgbImage::new(12, 12);
        fill(&mut img, 3, 3, 2, 5, RED);

        let extractor = red_extractor();
        let mask = extractor.mask(&img).unwrap();
        assert_eq!(mask.dim(), (12, 12));
        assert_eq!(extractor.boxes(&mask), extractor.extract(&img).unwrap());
    }
}
