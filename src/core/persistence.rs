//! 进度持久化
//!
//! 将循环历史与配置写入/从 JSON 文件加载（默认 neurocortex_progress.json），用于跨进程恢复。

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::FrameworkConfig;
use crate::core::error::Result;
use crate::srdf::types::CycleResult;

pub const DEFAULT_PROGRESS_FILE: &str = "neurocortex_progress.json";
pub const DEFAULT_ANALYSIS_REPORT: &str = "trawler_analysis.json";

/// neurocortex_progress.json 的顶层结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressFile {
    pub cycle_history: Vec<CycleResult>,
    pub config: FrameworkConfig,
    pub save_time: DateTime<Utc>,
}

impl ProgressFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

/// 以缩进格式写 JSON；父目录不存在时自动创建
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
