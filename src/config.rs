use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

// 颜色检测默认参数（目标颜色 74f3fe，RGB顺序）
pub const DEFAULT_TARGET_COLOR: TargetColor = TargetColor([0x74, 0xf3, 0xfe]);
pub const DEFAULT_TOLERANCE: u8 = 30;

// 矩形后处理默认参数
pub const DEFAULT_MERGE_MARGIN: u32 = 10;
pub const DEFAULT_MIN_WIDTH: u32 = 5;
pub const DEFAULT_MIN_HEIGHT: u32 = 5;

// 区域分类默认参数
pub const DEFAULT_ALLOWED_PROPORTION: f64 = 3.0;
pub const DEFAULT_NOISE_PERCENTAGE: f64 = 7.5;
pub const DEFAULT_PLAIN_PERCENTAGE: f64 = 90.0;

pub const DEFAULT_OUTPUT_PATH: &str = "result.jpg";

/// 按比例换算像素阈值：`floor(max(dimension * ratio, 1))`
pub fn scaled_threshold(dimension: u32, ratio: f64) -> u32 {
    (dimension as f64 * ratio).max(1.0).floor() as u32
}

/// 目标颜色，按RGB顺序存储
///
/// 可以从 `"74f3fe"` 或 `"#74f3fe"` 形式的十六进制字符串解析，
/// 序列化时同样输出为十六进制字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetColor(pub [u8; 3]);

impl TargetColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn channels(&self) -> [u8; 3] {
        self.0
    }
}

impl FromStr for TargetColor {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DetectError::InvalidColor(s.to_string()));
        }
        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| DetectError::InvalidColor(s.to_string()))?;
        }
        Ok(Self(channels))
    }
}

impl fmt::Display for TargetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for TargetColor {
    type Error = DetectError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TargetColor> for String {
    fn from(color: TargetColor) -> Self {
        color.to_string()
    }
}

/// 相对于图像高度的阈值比例
///
/// 不同分辨率的截图使用同一组比例，实际像素阈值由 [`ThresholdRatios::resolve`] 换算。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdRatios {
    /// 原始矩形向外扩展的边距
    pub padding: f64,
    pub merge_margin: f64,
    /// 合并后宽高的上限
    pub max_merge_size: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for ThresholdRatios {
    fn default() -> Self {
        Self {
            padding: 0.005,
            merge_margin: 0.001,
            max_merge_size: 0.4,
            min_width: 0.015,
            min_height: 0.015,
            max_width: 0.14,
            max_height: 0.14,
        }
    }
}

impl ThresholdRatios {
    /// 按图像高度换算成像素阈值
    pub fn resolve(&self, dimension: u32) -> Thresholds {
        let px = |ratio| scaled_threshold(dimension, ratio);
        Thresholds {
            padding: px(self.padding),
            merge_margin: px(self.merge_margin),
            max_merge_size: Some(px(self.max_merge_size)),
            min_width: px(self.min_width),
            min_height: px(self.min_height),
            max_width: Some(px(self.max_width)),
            max_height: Some(px(self.max_height)),
        }
    }
}

/// 以像素为单位的阈值，`None` 表示不限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub padding: u32,
    pub merge_margin: u32,
    pub max_merge_size: Option<u32>,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// 检测前裁剪的区域，按图像尺寸的比例给出
///
/// 裁剪框水平居中，垂直方向居中后再下移 `y_offset_ratio * height`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropRegion {
    pub width_ratio: f64,
    pub height_ratio: f64,
    pub y_offset_ratio: f64,
}

impl Default for CropRegion {
    fn default() -> Self {
        Self {
            width_ratio: 0.275,
            height_ratio: 0.35,
            y_offset_ratio: 0.025,
        }
    }
}

impl CropRegion {
    /// 计算裁剪框 `(x, y, width, height)`，结果总是落在图像内
    pub fn region(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let crop_w = ((width as f64 * self.width_ratio).floor() as u32).min(width);
        let crop_h = ((height as f64 * self.height_ratio).floor() as u32).min(height);
        let x = (width - crop_w) / 2;
        let y = ((height - crop_h) as f64 / 2.0 + height as f64 * self.y_offset_ratio).floor();
        let y = (y.max(0.0) as u32).min(height - crop_h);
        (x, y, crop_w, crop_h)
    }
}

/// 检测配置
///
/// 所有字段都有默认值，配置文件中缺省的字段会使用默认值填充。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// 目标颜色
    pub target_color: TargetColor,
    /// 每个通道允许的颜色偏差 (0 - 255)
    pub tolerance: u8,
    /// 合并矩形时使用的外扩边距（像素）
    pub merge_margin: u32,
    /// 保留矩形的最小宽度
    pub min_width: u32,
    /// 保留矩形的最小高度
    pub min_height: u32,
    /// 分类时的最大宽度，缺省表示不限制
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// 合并后宽高的上限，缺省表示不限制
    pub max_merge_size: Option<u32>,
    /// 原始矩形向外扩展的像素数
    pub padding: u32,
    pub allowed_proportion: f64,
    pub noise_percentage: f64,
    pub plain_percentage: f64,
    /// 设置后按图像高度换算阈值，覆盖上面的像素阈值
    pub ratios: Option<ThresholdRatios>,
    /// 设置后只在裁剪区域内检测
    pub crop: Option<CropRegion>,
    /// 设置后把中间结果图像写入该目录
    pub debug_dir: Option<PathBuf>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            target_color: DEFAULT_TARGET_COLOR,
            tolerance: DEFAULT_TOLERANCE,
            merge_margin: DEFAULT_MERGE_MARGIN,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            max_width: None,
            max_height: None,
            max_merge_size: None,
            padding: 0,
            allowed_proportion: DEFAULT_ALLOWED_PROPORTION,
            noise_percentage: DEFAULT_NOISE_PERCENTAGE,
            plain_percentage: DEFAULT_PLAIN_PERCENTAGE,
            ratios: None,
            crop: None,
            debug_dir: None,
        }
    }
}

impl DetectConfig {
    /// 像素阈值：配置了比例时按 `dimension` 换算，否则直接取配置值
    pub fn thresholds(&self, dimension: u32) -> Thresholds {
        match &self.ratios {
            Some(ratios) => ratios.resolve(dimension),
            None => Thresholds {
                padding: self.padding,
                merge_margin: self.merge_margin,
                max_merge_size: self.max_merge_size,
                min_width: self.min_width,
                min_height: self.min_height,
                max_width: self.max_width,
                max_height: self.max_height,
            },
        }
    }

    /// 从JSON配置文件加载
    ///
    /// # 错误处理
    /// 文件不存在或内容不是合法JSON时返回Err
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}
