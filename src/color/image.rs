use image::DynamicImage;
use std::path::Path;

use crate::error::{DetectError, Result};

/// 加载图像文件
///
/// 从指定路径加载图像文件。
///
/// # 参数
/// * `path` - 图像文件路径
///
/// # 返回值
/// 返回加载的DynamicImage对象
///
/// # 错误处理
/// 文件不存在时返回 `DetectError::Io`，解码失败时返回 `DetectError::Image`
///
/// # 示例
///
/// ```no_run
/// use iconbox::load_image;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let image = load_image("screen/4.jpg")?;
/// # Ok(())
/// # }
/// ```
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    // 验证路径是否有效
    let path = path.as_ref();
    if !path.exists() {
        return Err(DetectError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("图像文件不存在: {}", path.display()),
        )));
    }

    let img = image::open(path)?;
    Ok(img)
}

/// 保存图像
///
/// 保存前统一转换为RGB8，保证JPEG等不支持透明通道的格式也能写出。
/// 输出格式由文件扩展名决定。
pub fn save_image(img: &DynamicImage, path: impl AsRef<Path>) -> Result<()> {
    DynamicImage::ImageRgb8(img.to_rgb8()).save(path.as_ref())?;
    Ok(())
}
