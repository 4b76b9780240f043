use anyhow::{Result, anyhow};
use image::{DynamicImage, GrayImage, Luma};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};

/// 生成指定内容的条码图片, 四周留白
///
/// # 参数
///
/// * `contents` - 条码内容
/// * `format` - 条码格式
/// * `width` - 条码宽度
/// * `height` - 条码高度
pub fn render(contents: &str, format: BarcodeFormat, width: i32, height: i32) -> Result<DynamicImage> {
    const MARGIN: u32 = 20;

    let matrix = MultiFormatWriter::default()
        .encode(contents, &format, width, height)
        .map_err(|e| anyhow!("生成条码失败: {}", e))?;
    let (matrix_width, matrix_height) = (matrix.getWidth(), matrix.getHeight());
    let image = GrayImage::from_fn(
        matrix_width + MARGIN * 2,
        matrix_height + MARGIN * 2,
        |x, y| {
            let inside = (MARGIN..MARGIN + matrix_width).contains(&x)
                && (MARGIN..MARGIN + matrix_height).contains(&y);
            if inside && matrix.get(x - MARGIN, y - MARGIN) {
                Luma([0])
            } else {
                Luma([255])
            }
        },
    );
    Ok(DynamicImage::ImageLuma8(image))
}
