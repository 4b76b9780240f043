use std::{fs, io};

use anyhow::{Context, Result, bail};
use barcode::CompositeDecoder;
use metadata::SCAN_INFO;
use ocr::{Tesseract, TesseractConfig};
use tracing::{error, info};

use crate::{
    args::Args,
    batch::{BatchRunner, BatchSummary, list_images},
    log::init_log,
    run_log::{RUN_LOG_FILE, RunLog},
    scanner::Scanner,
};

mod args;
mod batch;
mod error;
mod extractor;
mod filter;
mod log;
mod preprocess;
mod run_log;
mod scanner;

/// 程序入口
fn application() -> Result<()> {
    let args = Args::new();

    init_log(&args)?;

    info!("欢迎使用运单号批量识别工具");

    let options = args.scan_options()?;
    options.validate()?;

    if !args.source.is_dir() {
        bail!("源目录 {} 不存在", args.source.display());
    }

    // 文字识别引擎, 路径无效时直接退出
    let tesseract = Tesseract::new(TesseractConfig {
        executable: args.tesseract.clone(),
        tessdata_dir: args.tessdata_dir.clone(),
    })?;
    info!("Tesseract 版本: {}", tesseract.version());
    if options.scan_text {
        tesseract.ensure_languages(&SCAN_INFO.ocr_passes)?;
    }

    // 条形码 + 二维码
    let decoder = CompositeDecoder::standard();
    let scanner = Scanner::new(&tesseract, &decoder, &SCAN_INFO)?;

    let files = list_images(&args.source)?;
    if files.is_empty() {
        bail!("源目录 {} 中没有图片文件", args.source.display());
    }
    info!("共发现 {} 个待处理文件", files.len());

    let success_dir = args.target.join("success");
    let summary = if args.dry_run {
        info!("试运行模式, 处理记录输出到控制台, 不移动文件");
        let runner = BatchRunner::new(&scanner, &options, &success_dir, true);
        // 控制台日志同样写入标准输出, 不长期持有锁
        let mut run_log = RunLog::new(io::stdout())?;
        let summary = runner.run(&files, &mut run_log)?;
        run_log.finish(&summary)?;
        summary
    } else {
        fs::create_dir_all(&success_dir)
            .with_context(|| format!("创建成功目录 {} 失败", success_dir.display()))?;
        let runner = BatchRunner::new(&scanner, &options, &success_dir, false);
        let mut run_log = RunLog::create(&args.target)?;
        let summary = runner.run(&files, &mut run_log)?;
        run_log.finish(&summary)?;
        info!(
            "处理记录已保存到: {}",
            args.target.join(RUN_LOG_FILE).display()
        );
        summary
    };

    report(&summary);
    Ok(())
}

/// 输出统计信息
fn report(summary: &BatchSummary) {
    info!(
        "处理完成, 总数: {}, 成功: {}, 失败: {}",
        summary.total, summary.success, summary.failed
    );
}

fn main() {
    match application() {
        Ok(_) => info!("程序已执行完毕"),
        Err(e) => {
            error!("程序存在异常: {:#}", e);
            std::process::exit(1);
        }
    }
}
