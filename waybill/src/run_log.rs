use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::Local;

use crate::batch::{BatchSummary, Outcome};

/// 处理记录文件名
pub const RUN_LOG_FILE: &str = "process_log.txt";

const SEPARATOR: &str = "----------------------------------------";

/// 纯文本处理记录
///
/// 每个文件一行, 结尾附带统计信息
pub struct RunLog<W: Write> {
    writer: W,
}

impl RunLog<BufWriter<File>> {
    /// 在目标目录下创建处理记录
    ///
    /// # 参数
    ///
    /// * `dir` - 目标目录
    pub fn create(dir: &Path) -> Result<Self> {
        let path = dir.join(RUN_LOG_FILE);
        let file = File::create(&path)
            .with_context(|| format!("创建处理记录 {} 失败", path.display()))?;
        RunLog::new(BufWriter::new(file))
    }
}

impl<W: Write> RunLog<W> {
    /// 写入记录头
    ///
    /// # 参数
    ///
    /// * `writer` - 输出目标
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(
            writer,
            "处理时间：{}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "{}", SEPARATOR)?;
        Ok(Self { writer })
    }

    /// 记录单个文件的处理结果
    ///
    /// # 参数
    ///
    /// * `file_name` - 原文件名
    /// * `outcome` - 处理结果
    pub fn record(&mut self, file_name: &str, outcome: &Outcome) -> Result<()> {
        match outcome {
            Outcome::Success { new_name } => {
                writeln!(self.writer, "成功 - {} -> {}", file_name, new_name)?
            }
            Outcome::NotFound => writeln!(self.writer, "失败 - {} (未识别到运单号)", file_name)?,
            Outcome::Error(message) => writeln!(self.writer, "错误 - {} ({})", file_name, message)?,
        }
        Ok(())
    }

    /// 写入统计信息并刷新
    ///
    /// # 参数
    ///
    /// * `summary` - 批量处理统计
    pub fn finish(mut self, summary: &BatchSummary) -> Result<W> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", SEPARATOR)?;
        writeln!(self.writer, "处理完成！")?;
        writeln!(self.writer, "总数：{}", summary.total)?;
        writeln!(self.writer, "成功：{}", summary.success)?;
        writeln!(self.writer, "失败：{}", summary.failed)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
