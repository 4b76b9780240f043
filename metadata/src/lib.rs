use lazy_static::lazy_static;

mod scan_info;
mod scan_options;

pub use scan_info::{PatternInfo, PreprocessInfo, ScanInfo};
pub use scan_options::ScanOptions;

lazy_static! {
    /// 内置识别信息
    pub static ref SCAN_INFO: ScanInfo = ScanInfo::new().expect("内置识别信息文件解析失败");
}
