use anyhow::Result;
use image::DynamicImage;
use rqrr::PreparedImage;
use tracing::{debug, warn};

use crate::decoder::{Barcode, BarcodeDecoder};

/// 基于 rqrr 的二维码识别
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl BarcodeDecoder for QrDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>> {
        let mut prepared = PreparedImage::prepare(image.to_luma8());
        let grids = prepared.detect_grids();

        let mut result = Vec::new();
        for grid in grids {
            // 定位到但无法解码的二维码直接跳过
            match grid.decode() {
                Ok((_, content)) => {
                    debug!("二维码识别结果: {}", content);
                    result.push(Barcode {
                        format: "QR_CODE".to_string(),
                        text: content,
                    });
                }
                Err(e) => warn!("二维码解码失败: {}", e),
            }
        }
        Ok(result)
    }
}
