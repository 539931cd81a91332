//! NeuroCortex - 自我强化开发框架（SRDF）
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: SRDF 主控循环、状态、停止监管、进度持久化、信号处理
//! - **observability**: tracing 日志初始化
//! - **srdf**: Trawler（分析）、Generator（方案生成）、Arbiter（验证与选择）与模型评估抽象

pub mod config;
pub mod core;
pub mod observability;
pub mod srdf;

pub use crate::config::{ConfigOverrides, FrameworkConfig};
pub use crate::core::{FrameworkHandle, SrdfError, SrdfFramework};
