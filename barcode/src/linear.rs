use anyhow::{Result, anyhow};
use image::DynamicImage;
use rxing::{BarcodeFormat, Exceptions, helpers::detect_multiple_in_luma};
use tracing::debug;

use crate::decoder::{Barcode, BarcodeDecoder};

/// 基于 rxing 的条形码识别
///
/// 二维码交由 [`crate::QrDecoder`] 处理, 此处忽略 rxing 识别出的二维码
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearDecoder;

impl BarcodeDecoder for LinearDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let symbols = match detect_multiple_in_luma(luma.into_raw(), width, height) {
            Ok(symbols) => symbols,
            Err(Exceptions::NotFoundException(_)) => return Ok(Vec::new()),
            Err(e) => return Err(anyhow!("条形码识别失败: {}", e)),
        };

        let result = symbols
            .iter()
            .filter(|symbol| *symbol.getBarcodeFormat() != BarcodeFormat::QR_CODE)
            .map(|symbol| {
                debug!(
                    "条形码识别结果: {} ({})",
                    symbol.getText(),
                    symbol.getBarcodeFormat()
                );
                Barcode {
                    format: symbol.getBarcodeFormat().to_string(),
                    text: symbol.getText().to_string(),
                }
            })
            .collect();
        Ok(result)
    }
}
