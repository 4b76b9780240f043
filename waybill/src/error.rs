use std::path::PathBuf;

use thiserror::Error;

/// 识别错误
///
/// 识别成功但未找到运单号时返回 `Ok(None)`, 不属于错误
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("无法读取图片 {source_name}: {reason}")]
    Read { source_name: String, reason: String },
    #[error("识别配置错误: {0}")]
    Config(String),
    #[error("条码识别失败: {0:#}")]
    Decode(anyhow::Error),
    #[error("文字识别失败: {0:#}")]
    Ocr(anyhow::Error),
}

/// 文件移动错误
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("目标文件已存在: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("移动文件失败: {0}")]
    Io(#[from] std::io::Error),
}
