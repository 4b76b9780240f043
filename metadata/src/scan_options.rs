use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result, anyhow};
use common::Region;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 识别选项
///
/// 单次识别过程中保持不变
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScanOptions {
    #[schemars(title = "识别条形码")]
    pub scan_barcode: bool,
    #[schemars(title = "识别二维码")]
    pub scan_qrcode: bool,
    #[schemars(title = "识别文字")]
    pub scan_text: bool,
    #[schemars(title = "识别区域 (比例坐标), 为空时识别整张图片")]
    pub region: Option<Region>,
    #[schemars(title = "最小长度")]
    pub min_length: usize,
    #[schemars(title = "最大长度")]
    pub max_length: usize,
    #[schemars(title = "允许大写字母")]
    pub uppercase: bool,
    #[schemars(title = "允许小写字母")]
    pub lowercase: bool,
    #[schemars(title = "允许数字")]
    pub digits: bool,
    #[schemars(title = "自定义允许字符")]
    pub custom_chars: String,
    #[schemars(title = "前缀")]
    pub prefix: String,
    #[schemars(title = "后缀")]
    pub suffix: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scan_barcode: true,
            scan_qrcode: true,
            scan_text: true,
            region: None,
            min_length: 1,
            max_length: 100,
            uppercase: false,
            lowercase: false,
            digits: false,
            custom_chars: String::new(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl ScanOptions {
    /// 通过文件名加载识别选项
    ///
    /// # 参数
    ///
    /// * `options_file` - 识别选项文件名
    pub fn load(options_file: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(options_file.as_ref()).context("读取识别选项文件失败")?;
        let options = serde_yaml::from_slice::<ScanOptions>(data.as_slice())
            .context("解析识别选项文件失败, 请检查格式是否正确")?;
        Ok(options)
    }

    /// 检查选项是否有效
    pub fn validate(&self) -> Result<()> {
        if !(self.scan_barcode || self.scan_qrcode || self.scan_text) {
            return Err(anyhow!("请至少选择一种识别方式"));
        }
        if self.min_length > self.max_length {
            return Err(anyhow!(
                "最小长度不能大于最大长度: {} > {}",
                self.min_length,
                self.max_length
            ));
        }
        if let Some(region) = &self.region {
            region.validate()?;
        }
        Ok(())
    }

    /// 是否需要识别条码 (条形码或二维码)
    pub fn scan_codes(&self) -> bool {
        self.scan_barcode || self.scan_qrcode
    }

    /// 允许的字符集合
    ///
    /// 为空表示不限制字符
    pub fn allowed_chars(&self) -> HashSet<char> {
        let mut allowed = HashSet::new();
        if self.uppercase {
            allowed.extend('A'..='Z');
        }
        if self.lowercase {
            allowed.extend('a'..='z');
        }
        if self.digits {
            allowed.extend('0'..='9');
        }
        allowed.extend(self.custom_chars.chars());
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() -> Result<()> {
        let options: ScanOptions = serde_yaml::from_str(
            "prefix: YS\nmin_length: 10\nmax_length: 10\nuppercase: true\ndigits: true\n",
        )?;
        assert_eq!(options.prefix, "YS");
        assert_eq!(options.min_length, 10);
        assert!(options.scan_text);
        assert!(options.region.is_none());
        assert!(!options.lowercase);
        Ok(())
    }

    #[test]
    fn test_region_yaml() -> Result<()> {
        let options: ScanOptions =
            serde_yaml::from_str("region:\n  x1: 0.1\n  y1: 0.2\n  x2: 0.9\n  y2: 0.5\n")?;
        assert_eq!(
            options.region,
            Some(Region {
                x1: 0.1,
                y1: 0.2,
                x2: 0.9,
                y2: 0.5
            })
        );
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(ScanOptions::default().validate().is_ok());

        let no_mode = ScanOptions {
            scan_barcode: false,
            scan_qrcode: false,
            scan_text: false,
            ..Default::default()
        };
        assert!(no_mode.validate().is_err());

        let bad_length = ScanOptions {
            min_length: 12,
            max_length: 10,
            ..Default::default()
        };
        assert!(bad_length.validate().is_err());

        let bad_region = ScanOptions {
            region: Some(Region {
                x1: 0.5,
                y1: 0.5,
                x2: 0.5,
                y2: 0.9,
            }),
            ..Default::default()
        };
        assert!(bad_region.validate().is_err());
    }

    #[test]
    fn test_allowed_chars() {
        assert!(ScanOptions::default().allowed_chars().is_empty());

        let options = ScanOptions {
            digits: true,
            custom_chars: "-_".to_string(),
            ..Default::default()
        };
        let allowed = options.allowed_chars();
        assert_eq!(allowed.len(), 12);
        assert!(allowed.contains(&'7'));
        assert!(allowed.contains(&'-'));
        assert!(!allowed.contains(&'A'));
    }

    #[test]
    fn test_bundled_profiles() -> Result<()> {
        let yunda: ScanOptions = serde_yaml::from_str(include_str!("../../profiles/yunda.yaml"))?;
        assert!(yunda.validate().is_ok());
        assert_eq!(yunda.prefix, "YS");
        assert_eq!(yunda.allowed_chars().len(), 36);

        let any: ScanOptions = serde_yaml::from_str(include_str!("../../profiles/any.yaml"))?;
        assert!(any.validate().is_ok());
        assert!(any.allowed_chars().is_empty());
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ScanOptions::load("/nonexistent/options.yaml").is_err());
    }
}
