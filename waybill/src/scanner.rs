use std::{fs, io::Cursor, path::Path};

use barcode::BarcodeDecoder;
use image::{DynamicImage, ImageReader};
use metadata::{ScanInfo, ScanOptions};
use ocr::Ocr;
use tracing::debug;

use crate::{
    error::ScanError, extractor::CandidateExtractor, filter::ResultFilter,
    preprocess::Preprocessor,
};

/// 运单号识别器
///
/// 只持有不可变引用, 可在多张图片间复用
pub struct Scanner<'a> {
    ocr: &'a dyn Ocr,
    decoder: &'a dyn BarcodeDecoder,
    info: &'a ScanInfo,
    extractor: CandidateExtractor<'a>,
    preprocessor: Preprocessor<'a>,
}

impl<'a> Scanner<'a> {
    /// 创建识别器实例
    ///
    /// # 参数
    ///
    /// * `ocr` - 文字识别器
    /// * `decoder` - 条码识别器
    /// * `info` - 识别基础信息
    pub fn new(
        ocr: &'a dyn Ocr,
        decoder: &'a dyn BarcodeDecoder,
        info: &'a ScanInfo,
    ) -> Result<Self, ScanError> {
        let extractor =
            CandidateExtractor::new(info).map_err(|e| ScanError::Config(format!("{:#}", e)))?;
        Ok(Self {
            ocr,
            decoder,
            info,
            extractor,
            preprocessor: Preprocessor::new(&info.preprocess),
        })
    }

    /// 识别图片文件
    ///
    /// # 参数
    ///
    /// * `path` - 图片路径
    /// * `options` - 识别选项
    pub fn scan_path(
        &self,
        path: &Path,
        options: &ScanOptions,
    ) -> Result<Option<String>, ScanError> {
        let source_name = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| ScanError::Read {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        // 解码失败时报告文件路径
        self.scan_bytes(&bytes, options).map_err(|e| match e {
            ScanError::Read { reason, .. } => ScanError::Read {
                source_name,
                reason,
            },
            other => other,
        })
    }

    /// 识别内存中的图片数据
    ///
    /// # 参数
    ///
    /// * `bytes` - 编码后的图片数据
    /// * `options` - 识别选项
    pub fn scan_bytes(
        &self,
        bytes: &[u8],
        options: &ScanOptions,
    ) -> Result<Option<String>, ScanError> {
        let image = decode_image(bytes, "<内存数据>")?;
        self.scan_image(image, options)
    }

    /// 识别已解码的图片, 返回第一个满足条件的运单号
    ///
    /// 未识别到运单号时返回 `Ok(None)`
    ///
    /// # 参数
    ///
    /// * `image` - 图片
    /// * `options` - 识别选项
    pub fn scan_image(
        &self,
        image: DynamicImage,
        options: &ScanOptions,
    ) -> Result<Option<String>, ScanError> {
        let pool = self.collect_candidates(image, options)?;
        let survivors = ResultFilter::new(options).filter(&pool);
        debug!("过滤后的结果: {:?}", survivors);
        Ok(survivors.into_iter().next())
    }

    /// 收集完整的候选池 (条码内容在前, 文字候选在后), 未经过滤
    ///
    /// # 参数
    ///
    /// * `image` - 图片
    /// * `options` - 识别选项
    pub fn collect_candidates(
        &self,
        image: DynamicImage,
        options: &ScanOptions,
    ) -> Result<Vec<String>, ScanError> {
        options
            .validate()
            .map_err(|e| ScanError::Config(format!("{:#}", e)))?;
        let image = crop(image, options)?;

        let mut pool = Vec::new();
        if options.scan_codes() {
            let barcodes = self.decoder.decode(&image).map_err(ScanError::Decode)?;
            for barcode in barcodes {
                debug!("条码识别结果: {}", barcode);
                pool.push(barcode.text);
            }
        }

        if options.scan_text {
            let lines = self.recognize_lines(&image)?;
            let candidates = self.extractor.extract(lines.iter().map(String::as_str));
            debug!("文字候选结果: {:?}", candidates);
            pool.extend(candidates);
        }

        Ok(pool)
    }

    /// 依次执行所有 OCR 配置, 按配置顺序合并文本行
    fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>, ScanError> {
        let processed = self.preprocessor.process(image);
        let mut lines = Vec::new();
        for pass in self.info.ocr_passes.iter() {
            let result = self
                .ocr
                .recognize(&processed, pass)
                .map_err(ScanError::Ocr)?;
            debug!("OCR [{}] 识别结果: {:?}", pass.name, result.text);
            lines.extend(result.lines().map(str::to_string));
        }
        Ok(lines)
    }
}

/// 按内容识别格式并解码图片
///
/// # 参数
///
/// * `bytes` - 编码后的图片数据
/// * `source_name` - 数据来源, 用于错误信息
fn decode_image(bytes: &[u8], source_name: &str) -> Result<DynamicImage, ScanError> {
    let read_error = |reason: String| ScanError::Read {
        source_name: source_name.to_string(),
        reason,
    };
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| read_error(e.to_string()))?
        .decode()
        .map_err(|e| read_error(e.to_string()))
}

/// 按识别区域裁剪图片
fn crop(image: DynamicImage, options: &ScanOptions) -> Result<DynamicImage, ScanError> {
    let Some(region) = &options.region else {
        return Ok(image);
    };
    let rect = region.to_pixel_rect(image.width(), image.height());
    if rect.width == 0 || rect.height == 0 {
        return Err(ScanError::Config(format!(
            "识别区域在 {}x{} 的图片上为空",
            image.width(),
            image.height()
        )));
    }
    debug!("裁剪识别区域: {:?}", rect);
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}
