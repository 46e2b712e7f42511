//! 调试输出模块
//!
//! 把检测过程中每个阶段的中间结果保存成图像，便于调参。

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::Array2;
use tracing::debug;

use crate::color::bounds::{ClassifiedBox, Rectangle};
use crate::color::detect::{GREEN, class_color, draw_rectangles};
use crate::color::image::save_image;
use crate::color::pipeline::Stages;
use crate::color::prevs::mask_to_image;
use crate::error::Result;

/// 中间结果图像的写入器
///
/// 文件名以阶段序号开头，按文件名排序即为处理顺序：
/// `0.cropped`、`1.mask`、`2.boxes`、`3.boxes.merged`、`4.boxes.kept`、
/// `5.highlight`、`5.mask.highlight`，以及每个区域的 `6.{编号}.{类别}`。
#[derive(Debug, Clone)]
pub struct DebugWriter {
    dir: PathBuf,
}

impl DebugWriter {
    /// 创建写入器，目录不存在时自动创建
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 以PNG格式保存一张图像，返回写入的路径
    pub fn save(&self, name: &str, image: &DynamicImage) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}.png"));
        save_image(image, &path)?;
        debug!(path = %path.display(), "写入调试图像");
        Ok(path)
    }

    /// 保存一次检测的全部中间结果
    ///
    /// # 参数
    /// * `frame` - 实际参与检测的图像（裁剪后）
    /// * `mask` - 颜色掩码
    /// * `raw` - 提取出的原始矩形
    /// * `stages` - 流水线各阶段的输出
    /// * `boxes` - 分类后的区域，坐标与 `frame` 一致
    pub fn write_stages(
        &self,
        frame: &DynamicImage,
        mask: &Array2<u8>,
        raw: &[Rectangle],
        stages: &Stages,
        boxes: &[ClassifiedBox],
    ) -> Result<()> {
        let mask_image = DynamicImage::ImageLuma8(mask_to_image(mask));
        let outline = |rects: &[Rectangle]| -> Vec<(Rectangle, [u8; 3])> {
            rects.iter().map(|rect| (*rect, GREEN)).collect()
        };

        self.save("0.cropped", frame)?;
        self.save("1.mask", &mask_image)?;
        self.save("2.boxes", &draw_rectangles(&mask_image, &outline(raw))?)?;
        self.save("3.boxes.merged", &draw_rectangles(&mask_image, &outline(&stages.merged))?)?;
        self.save("4.boxes.kept", &draw_rectangles(&mask_image, &outline(&stages.kept))?)?;

        let highlighted: Vec<_> = boxes.iter().map(|b| (b.rect, class_color(b.class))).collect();
        self.save("5.highlight", &draw_rectangles(frame, &highlighted)?)?;
        self.save("5.mask.highlight", &draw_rectangles(&mask_image, &highlighted)?)?;

        for (index, b) in boxes.iter().enumerate() {
            let t = b.tight;
            if t.width == 0 || t.height == 0 {
                continue;
            }
            let crop = mask_image.crop_imm(t.x.max(0) as u32, t.y.max(0) as u32, t.width, t.height);
            self.save(&format!("6.{index}.{}", b.class.name()), &crop)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::posts::BoxClass;

    #[test]
    fn creates_nested_directory() {
        let root = tempfile::tempdir().unwrap();
        let writer = DebugWriter::new(root.path().join("a/b")).unwrap();
        assert!(writer.dir().is_dir());

        let path = writer.save("x", &DynamicImage::new_rgb8(4, 4)).unwrap();
        assert_eq!(path.file_name().unwrap(), "x.png");
        assert!(path.is_file());
    }

    #[test]
    fn writes_every_stage() {
        let root = tempfile::tempdir().unwrap();
        let writer = DebugWriter::new(root.path()).unwrap();

        let mut mask = Array2::from_elem((10, 10), 0u8);
        mask[[2, 2]] = 255;
        let rect = Rectangle::new(2, 2, 1, 1);
        let stages = Stages { merged: vec![rect], unnested: vec![rect], kept: vec![] };
        let boxes = [ClassifiedBox { rect, tight: rect, coverage: 100.0, class: BoxClass::Plain }];

        writer
            .write_stages(&DynamicImage::new_rgb8(10, 10), &mask, &[rect], &stages, &boxes)
            .unwrap();

        for name in [
            "0.cropped", "1.mask", "2.boxes", "3.boxes.merged", "4.boxes.kept", "5.highlight",
            "5.mask.highlight", "6.0.plain",
        ] {
            assert!(root.path().join(format!("{name}.png")).is_file(), "缺少 {name}");
        }
    }
}
