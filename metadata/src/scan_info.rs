use anyhow::Result;
use common::OcrPass;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 图像预处理参数
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PreprocessInfo {
    #[schemars(title = "自适应阈值邻域半径 (邻域边长为 2r+1)")]
    pub threshold_block_radius: u32,
    #[schemars(title = "自适应阈值常数差值")]
    pub threshold_delta: i32,
    #[schemars(title = "中值降噪半径")]
    pub denoise_radius: u32,
    #[schemars(title = "局部直方图均衡化对比度限制")]
    pub clahe_clip_limit: f32,
    #[schemars(title = "局部直方图均衡化分块数 (每个方向)")]
    pub clahe_tiles: u32,
}

/// 候选提取正则
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PatternInfo {
    #[schemars(title = "两位字母前缀运单号")]
    pub prefixed: String,
    #[schemars(title = "通用运单号")]
    pub generic: String,
    #[schemars(title = "分隔符后文本 (第一个捕获组)")]
    pub separator: String,
    #[schemars(title = "分隔符后文本最小长度")]
    pub separator_min_length: usize,
}

/// 识别基础信息
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ScanInfo {
    #[schemars(title = "运单号关键词")]
    pub keywords: Vec<String>,
    #[schemars(title = "OCR 识别配置")]
    pub ocr_passes: Vec<OcrPass>,
    #[schemars(title = "图像预处理参数")]
    pub preprocess: PreprocessInfo,
    #[schemars(title = "候选提取正则")]
    pub patterns: PatternInfo,
}

impl ScanInfo {
    /// 加载解析内置识别信息文件
    pub fn new() -> Result<Self> {
        Ok(serde_yaml::from_str(include_str!("../scan_info.yaml"))?)
    }

    /// 文本行是否包含任一关键词
    ///
    /// # 参数
    ///
    /// * `line` - 文本行
    pub fn has_keyword(&self, line: &str) -> bool {
        self.keywords.iter().any(|keyword| line.contains(keyword.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_info() -> Result<()> {
        let info = ScanInfo::new()?;
        assert_eq!(info.keywords.len(), 13);
        assert_eq!(info.ocr_passes.len(), 3);
        assert_eq!(info.ocr_passes[0].lang, "chi_sim+eng");
        assert_eq!(info.ocr_passes[2].psm, 11);
        assert_eq!(info.preprocess.clahe_tiles, 8);
        assert_eq!(info.patterns.separator_min_length, 8);
        Ok(())
    }

    #[test]
    fn test_has_keyword() -> Result<()> {
        let info = ScanInfo::new()?;
        assert!(info.has_keyword("运单号: YS12345678"));
        assert!(info.has_keyword("Order # 42"));
        assert!(info.has_keyword("NO.1"));
        assert!(!info.has_keyword("no keyword here"));
        Ok(())
    }
}
