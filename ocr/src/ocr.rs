use anyhow::Result;
use common::OcrPass;
use image::GrayImage;

/// OCR 结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrResult {
    pub text: String,
}

impl OcrResult {
    /// 按行拆分识别文本
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

/// OCR 接口
pub trait Ocr {
    /// 按指定配置识别图片中的文字
    ///
    /// # 参数
    ///
    /// * `image` - 待识别的图片
    /// * `pass` - 识别配置
    fn recognize(&self, image: &GrayImage, pass: &OcrPass) -> Result<OcrResult>;
}
