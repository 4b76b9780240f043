use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use anyhow::{Context, Result};
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::{Layer, fmt, registry};

use crate::args::Args;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 本程序各模块的日志目标, 其余依赖库只输出警告以上
const OWN_TARGETS: [&str; 5] = ["waybill", "ocr", "barcode", "metadata", "common"];

/// 构建日志过滤器
///
/// # 参数
///
/// * `level` - 日志等级
fn log_filter(level: Level) -> Targets {
    let own = LevelFilter::from_level(level);
    let others = own.min(LevelFilter::WARN);
    OWN_TARGETS
        .iter()
        .fold(Targets::new().with_default(others), |filter, target| {
            filter.with_target(*target, own)
        })
}

/// 打开日志文件, 非追加模式下清空原有内容
///
/// # 参数
///
/// * `path` - 日志文件路径
/// * `append` - 是否追加
fn open_log_file(path: &Path, append: bool) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .append(append)
        .truncate(!append)
        .create(true)
        .open(path)
        .with_context(|| format!("打开日志文件 {} 失败", path.display()))
}

/// 初始化日志记录器
///
/// 控制台与日志文件使用相同的过滤条件
///
/// # 参数
///
/// * `args` - 命令行参数
pub fn init_log(args: &Args) -> Result<()> {
    let filter = log_filter(args.log_level.unwrap_or(Level::INFO));

    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(filter.clone());

    let file_layer = fmt::layer()
        .with_writer(open_log_file(Path::new(&args.log_file), args.append_log)?)
        .with_ansi(false)
        .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(filter);

    let subscriber = registry().with(console_layer).with(file_layer);
    tracing::subscriber::set_global_default(subscriber).context("设置全局日志记录器失败")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Write};

    use super::*;

    #[test]
    fn test_log_filter_levels() {
        let filter = log_filter(Level::DEBUG);
        assert!(filter.would_enable("waybill::scanner", &Level::DEBUG));
        assert!(filter.would_enable("ocr::tesseract", &Level::DEBUG));
        assert!(!filter.would_enable("rxing", &Level::DEBUG));
        assert!(filter.would_enable("rxing", &Level::WARN));

        let filter = log_filter(Level::ERROR);
        assert!(!filter.would_enable("waybill", &Level::WARN));
        assert!(!filter.would_enable("rqrr", &Level::WARN));
        assert!(filter.would_enable("rqrr", &Level::ERROR));
    }

    #[test]
    fn test_open_log_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("waybill.log");
        fs::write(&path, "old line\n")?;

        open_log_file(&path, true)?.write_all(b"new line\n")?;
        assert_eq!(fs::read_to_string(&path)?, "old line\nnew line\n");

        open_log_file(&path, false)?.write_all(b"fresh\n")?;
        assert_eq!(fs::read_to_string(&path)?, "fresh\n");
        Ok(())
    }
}
