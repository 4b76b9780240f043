use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use metadata::ScanOptions;
use tracing::{error, info, warn};

use crate::{error::MoveError, run_log::RunLog, scanner::Scanner};

/// 支持的文件扩展名
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "pdf"];

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { new_name: String }, // 已移动到成功目录
    NotFound,                     // 未识别到运单号
    Error(String),                // 读取、识别或移动失败
}

/// 批量处理统计, 错误计入失败
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn add(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Success { .. } => self.success += 1,
            Outcome::NotFound | Outcome::Error(_) => self.failed += 1,
        }
    }
}

/// 列出目录中待处理的文件, 按文件名排序
///
/// # 参数
///
/// * `dir` - 源目录
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("读取目录 {} 失败", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if supported {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// 将文件移动到目标目录并重命名
///
/// 先创建硬链接再删除源文件, 目标文件已存在时不覆盖
///
/// # 参数
///
/// * `source` - 源文件
/// * `dir` - 目标目录
/// * `new_name` - 新文件名
pub fn move_file(source: &Path, dir: &Path, new_name: &str) -> Result<PathBuf, MoveError> {
    let destination = dir.join(new_name);
    match fs::hard_link(source, &destination) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MoveError::DestinationExists(destination));
        }
        // 跨文件系统或不支持硬链接时复制
        Err(e) if matches!(e.kind(), ErrorKind::CrossesDevices | ErrorKind::Unsupported) => {
            copy_to_new(source, &destination)?;
        }
        Err(e) => return Err(MoveError::Io(e)),
    }
    fs::remove_file(source)?;
    Ok(destination)
}

/// 复制到新文件, 目标文件已存在时返回错误
fn copy_to_new(source: &Path, destination: &Path) -> Result<(), MoveError> {
    let mut target = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
    {
        Ok(target) => target,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MoveError::DestinationExists(destination.to_path_buf()));
        }
        Err(e) => return Err(MoveError::Io(e)),
    };
    if let Err(e) = io::copy(&mut File::open(source)?, &mut target) {
        drop(target);
        let _ = fs::remove_file(destination);
        return Err(MoveError::Io(e));
    }
    Ok(())
}

/// 以运单号作为新文件名, 保留原扩展名
///
/// # 参数
///
/// * `waybill` - 运单号
/// * `source` - 原文件路径
pub fn new_file_name(waybill: &str, source: &Path) -> String {
    match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.{}", waybill, ext),
        None => waybill.to_string(),
    }
}

/// 批量处理器
pub struct BatchRunner<'a> {
    scanner: &'a Scanner<'a>,
    options: &'a ScanOptions,
    success_dir: &'a Path,
    dry_run: bool,
}

impl<'a> BatchRunner<'a> {
    /// 创建批量处理器
    ///
    /// # 参数
    ///
    /// * `scanner` - 运单号识别器
    /// * `options` - 识别选项
    /// * `success_dir` - 成功目录
    /// * `dry_run` - 只识别不移动文件
    pub fn new(
        scanner: &'a Scanner<'a>,
        options: &'a ScanOptions,
        success_dir: &'a Path,
        dry_run: bool,
    ) -> Self {
        Self {
            scanner,
            options,
            success_dir,
            dry_run,
        }
    }

    /// 处理单个文件
    ///
    /// # 参数
    ///
    /// * `path` - 文件路径
    pub fn process_file(&self, path: &Path) -> Outcome {
        let waybill = match self.scanner.scan_path(path, self.options) {
            Ok(Some(waybill)) => waybill,
            Ok(None) => return Outcome::NotFound,
            Err(e) => return Outcome::Error(e.to_string()),
        };

        let new_name = new_file_name(&waybill, path);
        if self.dry_run {
            return Outcome::Success { new_name };
        }
        match move_file(path, self.success_dir, &new_name) {
            Ok(_) => Outcome::Success { new_name },
            Err(e) => Outcome::Error(e.to_string()),
        }
    }

    /// 依次处理所有文件, 单个文件失败不影响后续处理
    ///
    /// # 参数
    ///
    /// * `files` - 待处理文件
    /// * `run_log` - 处理记录
    pub fn run<W: Write>(&self, files: &[PathBuf], run_log: &mut RunLog<W>) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        for (index, path) in files.iter().enumerate() {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            let outcome = self.process_file(path);
            match &outcome {
                Outcome::Success { new_name } => {
                    info!("[{}/{}] 成功 {} -> {}", index + 1, files.len(), file_name, new_name)
                }
                Outcome::NotFound => {
                    warn!("[{}/{}] 未识别到运单号 {}", index + 1, files.len(), file_name)
                }
                Outcome::Error(message) => {
                    error!("[{}/{}] 处理 {} 出错: {}", index + 1, files.len(), file_name, message)
                }
            }

            run_log.record(&file_name, &outcome)?;
            summary.add(&outcome);
        }
        Ok(summary)
    }
}
