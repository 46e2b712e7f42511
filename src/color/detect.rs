use ab_glyph::{FontRef, PxScale};
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use imageproc::region_labelling::Connectivity;
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::color::bounds::{Bounds, ClassifiedBox, Detection, Rectangle};
use crate::color::debug::DebugWriter;
use crate::color::extract::ComponentExtractor;
use crate::color::pipeline::Pipeline;
use crate::color::posts::{BoxClass, ClassCounts, ClassifyRules};
use crate::color::prevs::{ColorRange, box_coverage};
use crate::config::{CropRegion, DetectConfig, TargetColor, ThresholdRatios};
use crate::error::{DetectError, Result};

pub const GREEN: [u8; 3] = [0x00, 0xFF, 0x00];

// 编号标签使用的字体
static LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");
const LABEL_SCALE: f32 = 14.0;

/// 各类别区域的绘制颜色
pub fn class_color(class: BoxClass) -> [u8; 3] {
    match class {
        BoxClass::Abnormal => [0x00, 0xFF, 0xFF],
        BoxClass::Plain => [0xFF, 0x00, 0x00],
        BoxClass::Small => [0x00, 0x00, 0xFF],
        BoxClass::Big => [0xFF, 0xFF, 0x00],
        BoxClass::Noisy => [0xFF, 0x00, 0xFF],
        BoxClass::Success => GREEN,
    }
}

/// 颜色区域检测器
///
/// 封装了完整的检测流程：可选裁剪、形状提取、矩形合并、去嵌套、尺寸过滤和区域分类。
///
/// # 示例
///
/// ```no_run
/// use iconbox::{ColorDetector, TargetColor, load_image};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let image = load_image("screen/4.jpg")?;
/// let detector = ColorDetector::new(TargetColor::new(0x74, 0xf3, 0xfe), 30)
///     .with_merge_margin(10)
///     .with_min_size(5, 5);
/// let bounds = detector.detect(&image)?;
/// println!("找到 {} 个图标", bounds.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ColorDetector {
    /// 形状提取器
    extractor: ComponentExtractor,
    /// 矩形后处理流水线
    pipeline: Pipeline,
    /// 分类规则，最小尺寸始终跟随流水线
    rules: ClassifyRules,
    /// 设置后按图像高度换算所有像素阈值
    ratios: Option<ThresholdRatios>,
    crop: Option<CropRegion>,
    debug_dir: Option<PathBuf>,
}

impl ColorDetector {
    /// 创建新的ColorDetector实例
    ///
    /// # 参数
    /// * `target` - 目标颜色
    /// * `tolerance` - 每个通道允许的偏差
    ///
    /// # 返回值
    /// 返回使用默认合并边距和最小尺寸的检测器
    pub fn new(target: TargetColor, tolerance: u8) -> Self {
        Self {
            extractor: ComponentExtractor::new(ColorRange::new(target, tolerance)),
            pipeline: Pipeline::default(),
            rules: ClassifyRules::default(),
            ratios: None,
            crop: None,
            debug_dir: None,
        }
    }

    /// 根据配置创建检测器
    pub fn from_config(config: &DetectConfig) -> Self {
        let rules = ClassifyRules {
            max_width: config.max_width,
            max_height: config.max_height,
            allowed_proportion: config.allowed_proportion,
            noise_percentage: config.noise_percentage,
            plain_percentage: config.plain_percentage,
            ..ClassifyRules::default()
        };
        let mut detector = Self::new(config.target_color, config.tolerance)
            .with_padding(config.padding)
            .with_pipeline(Pipeline::from_config(config))
            .with_rules(rules);
        detector.ratios = config.ratios;
        detector.crop = config.crop;
        detector.debug_dir = config.debug_dir.clone();
        detector
    }

    /// 设置连通性（默认八连通）
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.extractor = self.extractor.with_connectivity(connectivity);
        self
    }

    /// 设置原始矩形的外扩边距
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.extractor = self.extractor.with_padding(padding);
        self
    }

    /// 设置合并边距
    pub fn with_merge_margin(mut self, margin: u32) -> Self {
        self.pipeline = self.pipeline.with_merge_margin(margin);
        self
    }

    /// 设置最小宽高
    pub fn with_min_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.pipeline = self.pipeline.with_min_size(min_width, min_height);
        self
    }

    /// 设置分类时的最大宽高
    pub fn with_max_size(mut self, max_width: Option<u32>, max_height: Option<u32>) -> Self {
        self.rules.max_width = max_width;
        self.rules.max_height = max_height;
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_rules(mut self, rules: ClassifyRules) -> Self {
        self.rules = rules;
        self
    }

    /// 按图像高度的比例设置阈值，覆盖像素阈值
    pub fn with_ratios(mut self, ratios: ThresholdRatios) -> Self {
        self.ratios = Some(ratios);
        self
    }

    /// 只在裁剪区域内检测，结果坐标仍相对于原图
    pub fn with_crop(mut self, crop: CropRegion) -> Self {
        self.crop = Some(crop);
        self
    }

    /// 把中间结果图像写入目录
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn extractor(&self) -> &ComponentExtractor {
        &self.extractor
    }

    pub fn rules(&self) -> &ClassifyRules {
        &self.rules
    }

    /// 针对给定高度的图像确定实际使用的提取器、流水线和分类规则
    fn resolve(&self, height: u32) -> (ComponentExtractor, Pipeline, ClassifyRules) {
        match &self.ratios {
            Some(ratios) => {
                let t = ratios.resolve(height);
                let rules = ClassifyRules {
                    min_width: t.min_width,
                    min_height: t.min_height,
                    max_width: t.max_width,
                    max_height: t.max_height,
                    ..self.rules
                };
                (self.extractor.with_padding(t.padding), Pipeline::from_thresholds(&t), rules)
            }
            None => {
                let rules = ClassifyRules {
                    min_width: self.pipeline.min_width(),
                    min_height: self.pipeline.min_height(),
                    ..self.rules
                };
                (self.extractor, self.pipeline, rules)
            }
        }
    }

    /// 完整的检测流程：从图像到区域集合
    ///
    /// # 参数
    /// * `img` - 待检测的图像
    ///
    /// # 返回值
    /// 返回最终的区域集合，没有匹配颜色时返回空集合
    pub fn detect(&self, img: &DynamicImage) -> Result<Bounds> {
        Ok(self.analyze(img)?.bounds)
    }

    /// 检测并给每个去嵌套后的区域分类
    ///
    /// 阈值比例按整张图像的高度换算。设置了裁剪区域时只检测裁剪后的部分，
    /// 返回的坐标会平移回原图坐标系。
    pub fn analyze(&self, img: &DynamicImage) -> Result<Detection> {
        let start_time = Instant::now();
        let (extractor, pipeline, rules) = self.resolve(img.height());

        let (frame, (dx, dy)) = match &self.crop {
            Some(crop) => {
                let (x, y, w, h) = crop.region(img.width(), img.height());
                (Cow::Owned(img.crop_imm(x, y, w, h)), (x as i32, y as i32))
            }
            None => (Cow::Borrowed(img), (0, 0)),
        };

        let mask = extractor.mask(&frame.to_rgb8())?;
        let raw = extractor.boxes(&mask);
        let stages = pipeline.run_stages(&raw);

        let boxes: Vec<ClassifiedBox> = stages
            .unnested
            .iter()
            .map(|rect| {
                let coverage = box_coverage(&mask, rect);
                let tight = coverage.tight.unwrap_or(*rect);
                ClassifiedBox {
                    rect: *rect,
                    tight,
                    coverage: coverage.percentage,
                    class: rules.classify(&tight, coverage.percentage),
                }
            })
            .collect();

        if let Some(dir) = &self.debug_dir {
            DebugWriter::new(dir)?.write_stages(&frame, &mask, &raw, &stages, &boxes)?;
        }

        let counts: ClassCounts = boxes.iter().map(|b| b.class).collect();
        let boxes = boxes
            .into_iter()
            .map(|b| ClassifiedBox {
                rect: b.rect.translate(dx, dy),
                tight: b.tight.translate(dx, dy),
                ..b
            })
            .collect();
        let bounds: Bounds = stages.kept.iter().map(|r| r.translate(dx, dy)).collect::<Vec<_>>().into();

        info!(
            raw = raw.len(),
            icons = bounds.len(),
            success = counts.success,
            elapsed = ?start_time.elapsed(),
            "检测完成"
        );
        Ok(Detection { bounds, boxes, counts })
    }
}

/// 在图像上绘制一组矩形框
///
/// 每个矩形使用各自的颜色，线宽2像素。
pub fn draw_rectangles(image: &DynamicImage, boxes: &[(Rectangle, [u8; 3])]) -> Result<DynamicImage> {
    let (img_width, img_height) = image.dimensions();
    let mut dt = DrawTarget::new(img_width as i32, img_height as i32);

    // 将原始图像绘制到DrawTarget上
    let rgba_image = image.to_rgba8();
    let image_data: Vec<u32> = rgba_image
        .chunks(4)
        .map(|pixel| u32::from_le_bytes([pixel[2], pixel[1], pixel[0], pixel[3]]))
        .collect();

    let img = raqote::Image {
        width: img_width as i32,
        height: img_height as i32,
        data: &image_data,
    };
    dt.draw_image_at(0.0, 0.0, &img, &DrawOptions::new());

    let style = StrokeStyle {
        join: LineJoin::Miter,
        width: 2.0,
        ..StrokeStyle::default()
    };

    for (rect, [r, g, b]) in boxes {
        let mut pb = PathBuilder::new();
        pb.rect(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32);
        let path = pb.finish();
        let color = Source::Solid(SolidSource { r: *r, g: *g, b: *b, a: 0xFF });
        dt.stroke(&path, &color, &style, &DrawOptions::default());
    }

    // 将DrawTarget转换回图像
    let pixels: Vec<u8> = dt
        .get_data()
        .iter()
        .flat_map(|&pixel| {
            let bytes = pixel.to_le_bytes();
            [bytes[2], bytes[1], bytes[0], bytes[3]] // BGRA to RGBA
        })
        .collect();

    ImageBuffer::from_raw(img_width, img_height, pixels)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| DetectError::Render("绘制结果与图像尺寸不一致".to_string()))
}

/// 在图像上绘制检测结果
///
/// 每个区域用2像素宽的绿色矩形框出，并在框的左上角上方写出区域编号，
/// 编号即其在 `bounds` 中的位置。
///
/// # 参数
/// * `image` - 原始图像
/// * `bounds` - 检测结果
///
/// # 返回值
/// 返回绘制了检测框和编号的图像
pub fn draw_detections(image: &DynamicImage, bounds: &Bounds) -> Result<DynamicImage> {
    let boxes: Vec<_> = bounds.iter().map(|rect| (*rect, GREEN)).collect();
    let mut canvas = draw_rectangles(image, &boxes)?.to_rgba8();
    draw_labels(&mut canvas, bounds)?;
    Ok(DynamicImage::ImageRgba8(canvas))
}

fn draw_labels(canvas: &mut RgbaImage, bounds: &Bounds) -> Result<()> {
    let font = FontRef::try_from_slice(LABEL_FONT)
        .map_err(|e| DetectError::Render(format!("无法加载标签字体: {e}")))?;
    let [r, g, b] = GREEN;
    let scale = PxScale::from(LABEL_SCALE);

    for (index, rect) in bounds.labeled() {
        // 超出画布的部分会被裁掉
        let y = rect.y.saturating_sub(LABEL_SCALE as i32);
        draw_text_mut(canvas, Rgba([r, g, b, 0xFF]), rect.x, y, scale, &font, &index.to_string());
    }
    Ok(())
}
