//! SRDF 错误类型
//!
//! 各阶段对输入尽量宽容（降级为默认值 + warn 日志），只有以下情况才返回错误：
//! 配置非法、候选集为空、问题/建议列表长度不一致、评估失败、IO / JSON / 配置加载失败。

use thiserror::Error;

/// 框架运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum SrdfError {
    /// 阈值不在 [0,1]、max_cycles 为 0、间隔非法等
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Arbiter 收到空的候选列表
    #[error("Empty candidate set: nothing to validate")]
    EmptyCandidateSet,

    /// 外部传入的 issue / recommendation 列表长度不一致
    #[error("Mismatched analysis: {issues} issues vs {recommendations} recommendations")]
    MismatchedAnalysis {
        issues: usize,
        recommendations: usize,
    },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Framework is already running")]
    AlreadyRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, SrdfError>;
