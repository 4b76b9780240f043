use std::collections::HashSet;

use common::dedup_keep_order;
use metadata::ScanOptions;

/// 候选运单号过滤器
///
/// 纯判定, 相同选项下重复过滤结果不变
pub struct ResultFilter<'a> {
    options: &'a ScanOptions,
    allowed: HashSet<char>,
}

impl<'a> ResultFilter<'a> {
    /// 创建过滤器
    ///
    /// # 参数
    ///
    /// * `options` - 识别选项
    pub fn new(options: &'a ScanOptions) -> Self {
        Self {
            options,
            allowed: options.allowed_chars(),
        }
    }

    /// 候选运单号是否满足所有条件
    ///
    /// # 参数
    ///
    /// * `candidate` - 去除首尾空白后的候选运单号
    pub fn accept(&self, candidate: &str) -> bool {
        let length = candidate.chars().count();
        if length < self.options.min_length || length > self.options.max_length {
            return false;
        }
        if !self.allowed.is_empty() && candidate.chars().any(|c| !self.allowed.contains(&c)) {
            return false;
        }
        if !self.options.prefix.is_empty() && !candidate.starts_with(&self.options.prefix) {
            return false;
        }
        if !self.options.suffix.is_empty() && !candidate.ends_with(&self.options.suffix) {
            return false;
        }
        true
    }

    /// 过滤候选池, 保持原有顺序并去重
    ///
    /// # 参数
    ///
    /// * `pool` - 完整的候选池
    pub fn filter(&self, pool: &[String]) -> Vec<String> {
        dedup_keep_order(
            pool.iter()
                .map(|candidate| candidate.trim())
                .filter(|candidate| !candidate.is_empty() && self.accept(candidate))
                .map(str::to_string),
        )
    }
}
