use anyhow::{Result, anyhow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

//常用结构体

/// 识别区域
///
/// 以图片宽高的比例表示 (0.0 ~ 1.0), 左上角为 (`x1`, `y1`), 右下角为 (`x2`, `y2`)
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Region {
    #[schemars(title = "左上角 X 比例")]
    pub x1: f32,
    #[schemars(title = "左上角 Y 比例")]
    pub y1: f32,
    #[schemars(title = "右下角 X 比例")]
    pub x2: f32,
    #[schemars(title = "右下角 Y 比例")]
    pub y2: f32,
}

/// OCR 识别配置
///
/// 对应 Tesseract 的语言 (`-l`), 页面分割模式 (`--psm`) 和引擎模式 (`--oem`)
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OcrPass {
    #[schemars(title = "配置名称")]
    pub name: String,
    #[schemars(title = "识别语言, 多个语言用 + 连接")]
    pub lang: String,
    #[schemars(title = "页面分割模式 (3: 自动, 6: 统一文本块, 11: 稀疏文本)")]
    pub psm: u8,
    #[schemars(title = "OCR 引擎模式")]
    pub oem: u8,
}

/// 像素矩形
///
/// 左上角坐标为 (`x`, `y`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// 检查区域坐标是否有效
    ///
    /// 坐标必须为有限数, 且裁剪到 0~1 后面积不为空
    pub fn validate(&self) -> Result<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(anyhow!("识别区域坐标无效: {:?}", self));
        }
        let clamped = self.clamped();
        if clamped.x2 <= clamped.x1 || clamped.y2 <= clamped.y1 {
            return Err(anyhow!("识别区域为空: {:?}", self));
        }
        Ok(())
    }

    /// 将坐标裁剪到 0~1 之间
    pub fn clamped(&self) -> Self {
        Self {
            x1: self.x1.clamp(0.0, 1.0),
            y1: self.y1.clamp(0.0, 1.0),
            x2: self.x2.clamp(0.0, 1.0),
            y2: self.y2.clamp(0.0, 1.0),
        }
    }

    /// 换算为指定尺寸图片上的像素矩形
    ///
    /// 比例坐标向下取整, 结果总是位于图片范围内, 面积可能为 0
    ///
    /// # 参数
    ///
    /// * `width` - 图片宽度
    /// * `height` - 图片高度
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> PixelRect {
        let region = self.clamped();
        let x1 = (region.x1 * width as f32) as u32;
        let y1 = (region.y1 * height as f32) as u32;
        let x2 = ((region.x2 * width as f32) as u32).min(width);
        let y2 = ((region.y2 * height as f32) as u32).min(height);
        PixelRect {
            x: x1.min(width),
            y: y1.min(height),
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }
}

impl std::str::FromStr for Region {
    type Err = anyhow::Error;

    /// 解析 `x1,y1,x2,y2` 格式的区域
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| anyhow!("识别区域格式错误 {}: {}", s, e))?;
        match values.as_slice() {
            [x1, y1, x2, y2] => Ok(Self {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            }),
            _ => Err(anyhow!("识别区域需要 4 个数值 (x1,y1,x2,y2): {}", s)),
        }
    }
}

/// 清理候选文本
///
/// 转为大写并移除所有非 `A-Z0-9` 字符 (空白字符一并移除)
///
/// # 参数
///
/// - `s` - 字符串
pub fn clean_candidate(s: &str) -> String {
    s.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// 去重并保留首次出现的顺序
///
/// # 参数
///
/// - `items` - 待去重的列表
pub fn dedup_keep_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_candidate() {
        assert_eq!(clean_candidate("ys-1234 5678:90"), "YS1234567890");
        assert_eq!(clean_candidate("运单号：sf99"), "SF99");
        assert_eq!(clean_candidate("  "), "");
    }

    #[test]
    fn test_clean_candidate_idempotent() {
        for s in ["yt 0012-3456-78", "No.#A1b2", "快递单=ys12345678", "ÄBC123"] {
            let once = clean_candidate(s);
            assert_eq!(clean_candidate(&once), once);
        }
    }

    #[test]
    fn test_dedup_keep_order() {
        let items = vec!["A", "B", "A", "C"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assert_eq!(dedup_keep_order(items), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_region_from_str() -> Result<()> {
        let region: Region = "0.1, 0.2,0.5,0.75".parse()?;
        assert_eq!(
            region,
            Region {
                x1: 0.1,
                y1: 0.2,
                x2: 0.5,
                y2: 0.75
            }
        );
        assert!("0.1,0.2,0.5".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
        Ok(())
    }

    #[test]
    fn test_region_to_pixel_rect_clamps() {
        let region = Region {
            x1: -0.5,
            y1: 0.5,
            x2: 1.5,
            y2: 1.0,
        };
        assert_eq!(
            region.to_pixel_rect(200, 100),
            PixelRect {
                x: 0,
                y: 50,
                width: 200,
                height: 50
            }
        );
    }

    #[test]
    fn test_region_validate() {
        let whole = Region {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        };
        assert!(whole.validate().is_ok());
        let empty = Region {
            x1: 0.6,
            y1: 0.0,
            x2: 0.4,
            y2: 1.0,
        };
        assert!(empty.validate().is_err());
        let outside = Region {
            x1: 1.2,
            y1: 0.0,
            x2: 1.5,
            y2: 1.0,
        };
        assert!(outside.validate().is_err());
        let nan = Region {
            x1: f32::NAN,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        };
        assert!(nan.validate().is_err());
    }
}
