pub mod color;
pub mod config;
pub mod error;

// 重新导出color模块中的常用类型和函数
pub use color::{Bounds, ClassifiedBox, Detection, LabeledBox, Rectangle, Report};
pub use color::{ColorDetector, ComponentExtractor, DebugWriter, Pipeline, ShapeExtractor, Stages};
pub use color::{BoxClass, ClassCounts, ClassifyRules, draw_detections, draw_rectangles};
pub use color::{ColorRange, filter_big_boxes, filter_nested_boxes, filter_small_boxes};
pub use color::{load_image, merge_rectangles, merge_rectangles_capped, save_image};
pub use config::{CropRegion, DetectConfig, TargetColor, ThresholdRatios, Thresholds};
pub use error::DetectError;
