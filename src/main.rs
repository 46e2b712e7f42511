use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use iconbox::config::DEFAULT_OUTPUT_PATH;
use iconbox::{
    ColorDetector, CropRegion, DetectConfig, TargetColor, ThresholdRatios, draw_detections,
    load_image, save_image,
};

/// 按颜色查找图像中的图标，并输出标注后的图像
#[derive(Parser, Debug)]
#[command(name = "iconbox", version, about)]
struct Cli {
    /// 输入图像
    input: PathBuf,

    /// 标注结果输出路径
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// JSON配置文件，命令行参数优先于配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 目标颜色，十六进制RGB，例如 74f3fe
    #[arg(long)]
    color: Option<TargetColor>,

    /// 每个通道允许的颜色偏差
    #[arg(long)]
    tolerance: Option<u8>,

    /// 合并边距（像素）
    #[arg(long)]
    margin: Option<u32>,

    /// 最小宽度
    #[arg(long)]
    min_width: Option<u32>,

    /// 最小高度
    #[arg(long)]
    min_height: Option<u32>,

    /// 分类时的最大宽度
    #[arg(long)]
    max_width: Option<u32>,

    /// 分类时的最大高度
    #[arg(long)]
    max_height: Option<u32>,

    /// 合并结果的宽高上限
    #[arg(long)]
    max_merge: Option<u32>,

    /// 原始矩形外扩边距
    #[arg(long)]
    padding: Option<u32>,

    /// 按图像高度的默认比例换算阈值
    #[arg(long)]
    scale: bool,

    /// 只检测图像中央的默认裁剪区域
    #[arg(long)]
    crop: bool,

    /// 中间结果图像的输出目录，每张输入图像使用以文件名命名的子目录
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// 以JSON格式输出每个区域的编号和坐标
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<DetectConfig> {
        let mut config = match &self.config {
            Some(path) => DetectConfig::from_file(path)
                .with_context(|| format!("无法读取配置文件 {}", path.display()))?,
            None => DetectConfig::default(),
        };
        if let Some(color) = self.color {
            config.target_color = color;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(margin) = self.margin {
            config.merge_margin = margin;
        }
        if let Some(min_width) = self.min_width {
            config.min_width = min_width;
        }
        if let Some(min_height) = self.min_height {
            config.min_height = min_height;
        }
        if self.max_width.is_some() {
            config.max_width = self.max_width;
        }
        if self.max_height.is_some() {
            config.max_height = self.max_height;
        }
        if self.max_merge.is_some() {
            config.max_merge_size = self.max_merge;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if self.scale && config.ratios.is_none() {
            config.ratios = Some(ThresholdRatios::default());
        }
        if self.crop && config.crop.is_none() {
            config.crop = Some(CropRegion::default());
        }
        if let Some(dir) = &self.debug_dir {
            config.debug_dir = Some(dir.clone());
        }
        if let Some(dir) = config.debug_dir.take() {
            let label = self.input.file_stem().unwrap_or(self.input.as_os_str());
            config.debug_dir = Some(dir.join(label));
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    info!(?config, "使用配置");

    let image = load_image(&cli.input)
        .with_context(|| format!("无法加载图像 {}", cli.input.display()))?;
    info!(width = image.width(), height = image.height(), "图像加载完成");

    let detector = ColorDetector::from_config(&config);
    let detection = detector.analyze(&image)?;
    let bounds = &detection.bounds;

    for (index, rect) in bounds.labeled() {
        info!(index, x = rect.x, y = rect.y, width = rect.width, height = rect.height, "图标");
    }
    for b in &detection.boxes {
        info!(class = b.class.name(), coverage = b.coverage, rect = ?b.rect, "区域分类");
    }

    let annotated = draw_detections(&image, bounds)?;
    save_image(&annotated, &cli.output)
        .with_context(|| format!("无法保存结果 {}", cli.output.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&detection.report())?);
    } else {
        let c = &detection.counts;
        println!("找到的图标数量: {}", bounds.len());
        println!(
            "分类统计: success={} plain={} small={} big={} noisy={} abnormal={}",
            c.success, c.plain, c.small, c.big, c.noisy, c.abnormal
        );
    }

    Ok(())
}
