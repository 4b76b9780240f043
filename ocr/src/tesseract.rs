use std::{
    collections::HashSet,
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use anyhow::{Context, Result, anyhow};
use common::OcrPass;
use image::{GrayImage, ImageFormat};
use tracing::debug;

use crate::ocr::{Ocr, OcrResult};

/// Tesseract 配置
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// 可执行文件路径, 仅文件名时从 PATH 中查找
    pub executable: PathBuf,
    /// 语言数据目录, 为空时使用 Tesseract 默认目录
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            tessdata_dir: None,
        }
    }
}

/// 基于 Tesseract 命令行的 OCR 实现
///
/// 每次识别启动一个 Tesseract 进程, 图片通过临时 PNG 文件传递, 文本从标准输出读取
#[derive(Debug)]
pub struct Tesseract {
    config: TesseractConfig,
    version: String,
}

impl Tesseract {
    /// 创建 Tesseract 实例
    ///
    /// 会执行 `--version` 校验可执行文件, 无法运行时返回错误
    ///
    /// # 参数
    ///
    /// * `config` - Tesseract 配置
    pub fn new(config: TesseractConfig) -> Result<Self> {
        if let Some(dir) = &config.tessdata_dir {
            if !dir.is_dir() {
                return Err(anyhow!("Tesseract 语言数据目录不存在: {}", dir.display()));
            }
        }

        let output = run(Command::new(&config.executable).arg("--version")).with_context(|| {
            format!("找不到 Tesseract: {}", config.executable.display())
        })?;
        // 旧版本将版本信息输出到 stderr
        let version = first_line(&output.stdout)
            .or_else(|| first_line(&output.stderr))
            .unwrap_or_default();

        debug!("Tesseract 版本: {}", version);
        Ok(Self { config, version })
    }

    /// Tesseract 版本信息
    pub fn version(&self) -> &str {
        &self.version
    }

    /// 获取已安装的识别语言
    pub fn languages(&self) -> Result<HashSet<String>> {
        let mut command = Command::new(&self.config.executable);
        if let Some(dir) = &self.config.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command.arg("--list-langs");
        let output = run(&mut command).context("获取 Tesseract 语言列表失败")?;
        Ok(parse_languages(&String::from_utf8_lossy(&output.stdout)))
    }

    /// 检查识别配置所需的语言是否都已安装
    ///
    /// # 参数
    ///
    /// * `passes` - 识别配置
    pub fn ensure_languages(&self, passes: &[OcrPass]) -> Result<()> {
        let installed = self.languages()?;
        let mut missing = passes
            .iter()
            .flat_map(|pass| pass.lang.split('+'))
            .filter(|lang| !installed.contains(*lang))
            .map(String::from)
            .collect::<Vec<_>>();
        missing.sort();
        missing.dedup();
        if !missing.is_empty() {
            return Err(anyhow!("Tesseract 缺少语言数据: {}", missing.join(", ")));
        }
        Ok(())
    }

    /// 构建识别命令参数
    ///
    /// # 参数
    ///
    /// * `input` - 输入图片路径
    /// * `pass` - 识别配置
    fn build_args(&self, input: &Path, pass: &OcrPass) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into(), "stdout".into()];
        if let Some(dir) = &self.config.tessdata_dir {
            args.push("--tessdata-dir".into());
            args.push(dir.into());
        }
        args.push("-l".into());
        args.push(pass.lang.as_str().into());
        args.push("--oem".into());
        args.push(pass.oem.to_string().into());
        args.push("--psm".into());
        args.push(pass.psm.to_string().into());
        args
    }
}

impl Ocr for Tesseract {
    fn recognize(&self, image: &GrayImage, pass: &OcrPass) -> Result<OcrResult> {
        let input = tempfile::Builder::new()
            .prefix("waybill-ocr-")
            .suffix(".png")
            .tempfile()
            .context("创建 OCR 临时文件失败")?
            .into_temp_path();
        image
            .save_with_format(&input, ImageFormat::Png)
            .context("写入 OCR 临时文件失败")?;

        let output = run(Command::new(&self.config.executable).args(self.build_args(&input, pass)))
            .with_context(|| format!("OCR 识别失败 ({})", pass.name))?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        debug!("OCR 配置 {} 识别结果: {:?}", pass.name, text);
        Ok(OcrResult { text })
    }
}

/// 执行命令, 进程无法启动或退出码非 0 时返回错误
fn run(command: &mut Command) -> Result<Output> {
    let output = command
        .stdin(Stdio::null())
        .output()
        .context("启动 Tesseract 进程失败")?;
    if !output.status.success() {
        return Err(anyhow!(
            "Tesseract 退出异常 ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(output)
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from)
}

/// 解析 `--list-langs` 输出
///
/// 第一行为语言数据目录说明, 其余每行一个语言
fn parse_languages(output: &str) -> HashSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(String::from)
        .collect()
}
