use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use metadata::{ScanInfo, ScanOptions};
use schemars::schema_for;

/// 生成识别信息与识别选项文件的 JSON Schema, 供编辑器校验 YAML
fn main() -> Result<()> {
    let vscode_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../.vscode");
    fs::create_dir_all(&vscode_dir).context("创建 .vscode 目录失败")?;

    let scan_info_schema = serde_json::to_string_pretty(&schema_for!(ScanInfo))?;
    fs::write(vscode_dir.join("scan_info.schema.json"), scan_info_schema)?;

    let scan_options_schema = serde_json::to_string_pretty(&schema_for!(ScanOptions))?;
    fs::write(
        vscode_dir.join("scan_options.schema.json"),
        scan_options_schema,
    )?;
    Ok(())
}
