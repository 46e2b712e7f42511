//! 错误类型

use thiserror::Error;

/// iconbox 库的统一错误类型
#[derive(Error, Debug)]
pub enum DetectError {
    /// 上游提供的矩形宽或高为负数
    #[error("invalid rectangle #{index}: ({x}, {y}, {width}, {height}) has a negative size")]
    InvalidRectangle {
        index: usize,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("invalid color {0:?}: expected six hex digits such as \"74f3fe\"")]
    InvalidColor(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, DetectError>;
