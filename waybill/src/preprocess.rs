use anyhow::{Result, anyhow};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;
use metadata::PreprocessInfo;
use tracing::{debug, warn};

/// 图像预处理器
///
/// 依次执行: 灰度化 -> 自适应阈值 -> 降噪 -> 局部直方图均衡化
pub struct Preprocessor<'a> {
    info: &'a PreprocessInfo,
}

impl<'a> Preprocessor<'a> {
    /// 创建预处理器
    ///
    /// # 参数
    ///
    /// * `info` - 预处理参数
    pub fn new(info: &'a PreprocessInfo) -> Self {
        Self { info }
    }

    /// 预处理图像以提高文字识别率
    ///
    /// 任一步骤失败时返回灰度图, 不影响后续识别
    ///
    /// # 参数
    ///
    /// * `image` - 原始图像
    pub fn process(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        match self.enhance(&gray) {
            Ok(enhanced) => enhanced,
            Err(e) => {
                warn!("图像预处理失败, 使用灰度图继续识别: {}", e);
                gray
            }
        }
    }

    fn enhance(&self, gray: &GrayImage) -> Result<GrayImage> {
        let binary = adaptive_threshold(
            gray,
            self.info.threshold_block_radius,
            self.info.threshold_delta,
        )?;
        let denoised = denoise(&binary, self.info.denoise_radius)?;
        let enhanced = clahe(&denoised, self.info.clahe_tiles, self.info.clahe_clip_limit)?;
        debug!("图像预处理完成: {:?}", enhanced.dimensions());
        Ok(enhanced)
    }
}

/// 自适应阈值二值化
///
/// 像素值大于邻域均值减 `delta` 时为白色, 否则为黑色
///
/// # 参数
///
/// * `gray` - 灰度图
/// * `block_radius` - 邻域半径
/// * `delta` - 常数差值
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, delta: i32) -> Result<GrayImage> {
    let (width, height) = gray.dimensions();
    let side = 2 * block_radius + 1;
    if width < side || height < side {
        return Err(anyhow!(
            "图片尺寸 {}x{} 小于阈值邻域 {}x{}",
            width,
            height,
            side,
            side
        ));
    }

    let (w, h) = (width as usize, height as usize);
    let iw = w + 1;
    let mut integral = vec![0u64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += gray.get_pixel(x as u32, y as u32).0[0] as u64;
            integral[(y + 1) * iw + x + 1] = row_sum + integral[y * iw + x + 1];
        }
    }

    let r = block_radius as usize;
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let x0 = x.saturating_sub(r);
        let y0 = y.saturating_sub(r);
        let x1 = (x + r + 1).min(w);
        let y1 = (y + r + 1).min(h);
        let area = ((x1 - x0) * (y1 - y0)) as i64;
        let sum = (integral[y1 * iw + x1] + integral[y0 * iw + x0]) as i64
            - integral[y0 * iw + x1] as i64
            - integral[y1 * iw + x0] as i64;
        let threshold = sum / area - delta as i64;
        let value = gray.get_pixel(x as u32, y as u32).0[0] as i64;
        if value > threshold { Luma([255]) } else { Luma([0]) }
    }))
}

/// 中值滤波降噪
///
/// # 参数
///
/// * `image` - 灰度图
/// * `radius` - 滤波半径
pub fn denoise(image: &GrayImage, radius: u32) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("图片为空, 无法降噪"));
    }
    Ok(median_filter(image, radius, radius))
}

/// 限制对比度的局部直方图均衡化 (CLAHE)
///
/// 每个分块计算裁剪后的直方图映射, 像素值在相邻 4 个分块的映射间双线性插值
///
/// # 参数
///
/// * `image` - 灰度图
/// * `tiles` - 每个方向的分块数
/// * `clip_limit` - 对比度限制
pub fn clahe(image: &GrayImage, tiles: u32, clip_limit: f32) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    if tiles == 0 || width < tiles || height < tiles {
        return Err(anyhow!(
            "图片尺寸 {}x{} 不足以划分 {}x{} 个分块",
            width,
            height,
            tiles,
            tiles
        ));
    }

    let tiles = tiles as usize;
    let (w, h) = (width as usize, height as usize);
    let tile_w = w / tiles;
    let tile_h = h / tiles;

    let mut maps = vec![[0u8; 256]; tiles * tiles];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles - 1 { w } else { x0 + tile_w };
            let y1 = if ty == tiles - 1 { h } else { y0 + tile_h };

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[image.get_pixel(x as u32, y as u32).0[0] as usize] += 1;
                }
            }
            let pixels = ((x1 - x0) * (y1 - y0)) as u32;
            maps[ty * tiles + tx] = clipped_mapping(&mut hist, pixels, clip_limit);
        }
    }

    Ok(GrayImage::from_fn(width, height, |x, y| {
        let pixel = image.get_pixel(x, y).0[0] as usize;
        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let last = tiles as i32 - 1;
        let tx0 = (fx.floor() as i32).clamp(0, last) as usize;
        let tx1 = (fx.floor() as i32 + 1).clamp(0, last) as usize;
        let ty0 = (fy.floor() as i32).clamp(0, last) as usize;
        let ty1 = (fy.floor() as i32 + 1).clamp(0, last) as usize;
        let ax = fx - fx.floor();
        let ay = fy - fy.floor();

        let v00 = maps[ty0 * tiles + tx0][pixel] as f32;
        let v10 = maps[ty0 * tiles + tx1][pixel] as f32;
        let v01 = maps[ty1 * tiles + tx0][pixel] as f32;
        let v11 = maps[ty1 * tiles + tx1][pixel] as f32;
        let top = v00 * (1.0 - ax) + v10 * ax;
        let bottom = v01 * (1.0 - ax) + v11 * ax;
        let value = top * (1.0 - ay) + bottom * ay;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    }))
}

/// 裁剪直方图并计算累计分布映射表
fn clipped_mapping(hist: &mut [u32; 256], pixels: u32, clip_limit: f32) -> [u8; 256] {
    let clip = ((clip_limit * pixels as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let per_bin = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += per_bin;
        if i < remainder {
            *bin += 1;
        }
    }

    let mut map = [0u8; 256];
    let mut cdf = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        cdf += bin;
        map[i] = ((cdf as f32 / pixels as f32) * 255.0).round().min(255.0) as u8;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> PreprocessInfo {
        PreprocessInfo {
            threshold_block_radius: 5,
            threshold_delta: 2,
            denoise_radius: 1,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
        }
    }

    /// 左暗右亮的渐变背景上有一条黑色竖线
    fn uneven_page() -> GrayImage {
        GrayImage::from_fn(64, 32, |x, _| {
            if (30..33).contains(&x) {
                Luma([10])
            } else {
                Luma([80 + (x * 2) as u8])
            }
        })
    }

    #[test]
    fn test_adaptive_threshold_uniform_is_white() -> Result<()> {
        let gray = GrayImage::from_pixel(20, 20, Luma([90]));
        let binary = adaptive_threshold(&gray, 5, 2)?;
        assert!(binary.pixels().all(|p| p.0[0] == 255));
        Ok(())
    }

    #[test]
    fn test_adaptive_threshold_uneven_lighting() -> Result<()> {
        let binary = adaptive_threshold(&uneven_page(), 5, 2)?;
        assert_eq!(binary.get_pixel(31, 16).0[0], 0);
        assert_eq!(binary.get_pixel(5, 16).0[0], 255);
        assert_eq!(binary.get_pixel(60, 16).0[0], 255);
        Ok(())
    }

    #[test]
    fn test_adaptive_threshold_too_small() {
        let gray = GrayImage::from_pixel(4, 40, Luma([90]));
        assert!(adaptive_threshold(&gray, 5, 2).is_err());
    }

    #[test]
    fn test_denoise_removes_speck() -> Result<()> {
        let mut gray = GrayImage::from_pixel(9, 9, Luma([255]));
        gray.put_pixel(4, 4, Luma([0]));
        let denoised = denoise(&gray, 1)?;
        assert_eq!(denoised.get_pixel(4, 4).0[0], 255);
        Ok(())
    }

    #[test]
    fn test_clahe_stretches_low_contrast() -> Result<()> {
        let gray = GrayImage::from_fn(32, 32, |x, y| {
            Luma([if (x + y) % 2 == 0 { 100 } else { 110 }])
        });
        let enhanced = clahe(&gray, 2, 40.0)?;
        let dark = enhanced.get_pixel(0, 0).0[0];
        let bright = enhanced.get_pixel(1, 0).0[0];
        assert!(bright > dark);
        assert!(bright - dark > 10);
        Ok(())
    }

    #[test]
    fn test_clahe_too_small() {
        let gray = GrayImage::from_pixel(4, 4, Luma([0]));
        assert!(clahe(&gray, 8, 2.0).is_err());
    }

    #[test]
    fn test_process_keeps_dimensions() {
        let info = info();
        let processed = Preprocessor::new(&info).process(&DynamicImage::ImageLuma8(uneven_page()));
        assert_eq!(processed.dimensions(), (64, 32));
    }

    #[test]
    fn test_process_falls_back_to_gray() {
        let info = info();
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([77])));
        let processed = Preprocessor::new(&info).process(&image);
        assert_eq!(processed, image.to_luma8());
    }
}
