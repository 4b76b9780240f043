use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use common::Region;
use metadata::ScanOptions;
use tracing::Level;

/// 运单号批量识别工具: 识别图片中的条码与文字, 按运单号重命名并移动到成功目录
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// 待处理图片目录
    #[arg(short, long)]
    pub source: PathBuf,

    /// 输出目录 (成功文件移动到其下的 success 目录, 处理记录写入 process_log.txt)
    #[arg(short, long)]
    pub target: PathBuf,

    /// 识别选项文件路径 (YAML)
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// 不识别条形码
    #[arg(long, default_value_t = false)]
    pub no_barcode: bool,

    /// 不识别二维码
    #[arg(long, default_value_t = false)]
    pub no_qrcode: bool,

    /// 不识别文字
    #[arg(long, default_value_t = false)]
    pub no_text: bool,

    /// 运单号最小长度
    #[arg(long)]
    pub min_length: Option<usize>,

    /// 运单号最大长度
    #[arg(long)]
    pub max_length: Option<usize>,

    /// 允许大写字母
    #[arg(long, default_value_t = false)]
    pub uppercase: bool,

    /// 允许小写字母
    #[arg(long, default_value_t = false)]
    pub lowercase: bool,

    /// 允许数字
    #[arg(long, default_value_t = false)]
    pub digits: bool,

    /// 自定义允许字符
    #[arg(long)]
    pub custom_chars: Option<String>,

    /// 运单号前缀
    #[arg(long)]
    pub prefix: Option<String>,

    /// 运单号后缀
    #[arg(long)]
    pub suffix: Option<String>,

    /// 识别区域比例坐标 x1,y1,x2,y2 (0~1)
    #[arg(long, allow_hyphen_values = true)]
    pub region: Option<Region>,

    /// Tesseract 可执行文件路径
    #[arg(long, default_value = "tesseract")]
    pub tesseract: PathBuf,

    /// Tesseract 语言数据目录
    #[arg(long)]
    pub tessdata_dir: Option<PathBuf>,

    /// 日志等级 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: Option<Level>,

    /// 日志文件路径
    #[arg(long, default_value = "waybill.log")]
    pub log_file: String,

    /// 追加日志到文件
    #[arg(long, default_value_t = false)]
    pub append_log: bool,

    /// 只识别并输出候选结果, 不移动文件
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl Args {
    /// 创建命令行参数解析器
    pub fn new() -> Self {
        Self::parse()
    }

    /// 合并识别选项文件与命令行参数
    ///
    /// 命令行参数优先
    pub fn scan_options(&self) -> Result<ScanOptions> {
        let mut options = match &self.profile {
            Some(profile) => ScanOptions::load(profile)?,
            None => ScanOptions::default(),
        };

        if self.no_barcode {
            options.scan_barcode = false;
        }
        if self.no_qrcode {
            options.scan_qrcode = false;
        }
        if self.no_text {
            options.scan_text = false;
        }
        if let Some(min_length) = self.min_length {
            options.min_length = min_length;
        }
        if let Some(max_length) = self.max_length {
            options.max_length = max_length;
        }
        options.uppercase |= self.uppercase;
        options.lowercase |= self.lowercase;
        options.digits |= self.digits;
        if let Some(custom_chars) = &self.custom_chars {
            options.custom_chars = custom_chars.clone();
        }
        if let Some(prefix) = &self.prefix {
            options.prefix = prefix.clone();
        }
        if let Some(suffix) = &self.suffix {
            options.suffix = suffix.clone();
        }
        if let Some(region) = self.region {
            options.region = Some(region);
        }
        Ok(options)
    }
}
