use std::fmt;

use anyhow::Result;
use image::DynamicImage;

/// 条码识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub format: String,
    pub text: String,
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.format, self.text)
    }
}

/// 条码识别接口
pub trait BarcodeDecoder {
    /// 识别图片中的所有条码
    ///
    /// 未发现条码时返回空列表, 结果顺序由具体实现决定
    ///
    /// # 参数
    ///
    /// * `image` - 待识别的图片
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>>;
}

/// 组合识别器, 按顺序调用所有识别器并合并结果
#[derive(Default)]
pub struct CompositeDecoder {
    decoders: Vec<Box<dyn BarcodeDecoder>>,
}

impl CompositeDecoder {
    /// 条形码 + 二维码
    pub fn standard() -> Self {
        Self::default()
            .with(crate::LinearDecoder)
            .with(crate::QrDecoder)
    }

    /// 追加识别器
    ///
    /// # 参数
    ///
    /// * `decoder` - 识别器
    pub fn with(mut self, decoder: impl BarcodeDecoder + 'static) -> Self {
        self.decoders.push(Box::new(decoder));
        self
    }
}

impl BarcodeDecoder for CompositeDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>> {
        let mut result = Vec::new();
        for decoder in self.decoders.iter() {
            result.extend(decoder.decode(image)?);
        }
        Ok(result)
    }
}
