use anyhow::{Context, Result};
use common::{clean_candidate, dedup_keep_order};
use metadata::ScanInfo;
use regex::Regex;

/// 候选运单号提取器
///
/// 对每行文本同时执行关键词提取和直接匹配
pub struct CandidateExtractor<'a> {
    info: &'a ScanInfo,
    prefixed: Regex,
    generic: Regex,
    separator: Regex,
}

impl<'a> CandidateExtractor<'a> {
    /// 编译提取正则
    ///
    /// # 参数
    ///
    /// * `info` - 识别基础信息
    pub fn new(info: &'a ScanInfo) -> Result<Self> {
        let patterns = &info.patterns;
        Ok(Self {
            info,
            prefixed: Regex::new(&patterns.prefixed).context("前缀运单号正则无效")?,
            generic: Regex::new(&patterns.generic).context("通用运单号正则无效")?,
            separator: Regex::new(&patterns.separator).context("分隔符正则无效")?,
        })
    }

    /// 提取单行文本中的候选运单号, 结果未去重
    ///
    /// # 参数
    ///
    /// * `line` - 文本行
    pub fn extract_line(&self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let mut raw = Vec::new();
        if self.info.has_keyword(line) {
            raw.extend(self.find_all(&self.prefixed, line));
            for caps in self.separator.captures_iter(line) {
                let Some(value) = caps.get(1) else {
                    continue;
                };
                let cleaned = clean_candidate(value.as_str());
                if cleaned.len() >= self.info.patterns.separator_min_length {
                    raw.push(cleaned);
                }
            }
        }
        raw.extend(self.find_all(&self.prefixed, line));
        raw.extend(self.find_all(&self.generic, line));

        raw.into_iter()
            .map(|candidate| clean_candidate(&candidate))
            .filter(|candidate| !candidate.is_empty())
            .collect()
    }

    /// 提取多行文本中的候选运单号, 按首次出现顺序去重
    ///
    /// # 参数
    ///
    /// * `lines` - 所有识别配置的文本行
    pub fn extract<'l>(&self, lines: impl IntoIterator<Item = &'l str>) -> Vec<String> {
        dedup_keep_order(lines.into_iter().flat_map(|line| self.extract_line(line)))
    }

    fn find_all(&self, regex: &Regex, line: &str) -> Vec<String> {
        regex
            .find_iter(line)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
