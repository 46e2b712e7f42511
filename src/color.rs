//! Color模块 - 按目标颜色查找图标区域
//!
//! 该模块提供完整的检测流程，包括：
//! - 颜色掩码生成
//! - 连通区域提取
//! - 矩形合并
//! - 嵌套框和小框过滤
//! - 区域分类（宽高比、纯色、尺寸、噪声）
//! - 可视化绘制和调试输出
//!
//! # 主要组件
//!
//! - ColorDetector：核心检测器结构，封装了检测流程
//! - Pipeline：矩形后处理流水线（合并 → 去嵌套 → 尺寸过滤）
//! - ShapeExtractor：从图像中提取原始矩形的接口
//! - ClassifyRules：区域分类规则
//! - draw_detections：在图像上绘制检测结果和编号
//!
//! # 工作流程
//!
//! 1. 使用load_image加载待检测图像
//! 2. 创建ColorDetector实例并配置参数
//! 3. 调用detect方法执行检测，需要分类统计时调用analyze
//! 4. 使用draw_detections绘制检测结果
//!
//! # 示例
//!
//! ```no_run
//! use iconbox::{ColorDetector, DetectConfig, draw_detections, load_image, save_image};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = load_image("screen/4.jpg")?;
//! let detector = ColorDetector::from_config(&DetectConfig::default());
//!
//! let bounds = detector.detect(&image)?;
//! let result_image = draw_detections(&image, &bounds)?;
//! save_image(&result_image, "result.jpg")?;
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod debug;
pub mod detect;
pub mod extract;
pub mod image;
pub mod merge;
pub mod pipeline;
pub mod posts;
pub mod prevs;

// 重新导出常用类型和函数
pub use bounds::{Bounds, ClassifiedBox, Detection, LabeledBox, Rectangle, Report};
pub use debug::DebugWriter;
pub use detect::{ColorDetector, draw_detections, draw_rectangles};
pub use extract::{ComponentExtractor, ShapeExtractor};
pub use self::image::{load_image, save_image};
pub use merge::{merge_rectangles, merge_rectangles_capped};
pub use pipeline::{Pipeline, Stages};
pub use posts::{BoxClass, ClassCounts, ClassifyRules, filter_big_boxes, filter_nested_boxes, filter_small_boxes};
pub use prevs::ColorRange;
