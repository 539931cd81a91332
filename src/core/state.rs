//! 状态定义：框架阶段与对外状态快照
//!
//! Idle → Running → (Idle | Stopped)。达到 max_cycles 回到 Idle；收到停止请求进入 Stopped。
//! Stopped 不是终态，可以再次 start。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::FrameworkConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkPhase {
    Idle,
    Running,
    Stopped,
}

impl FrameworkPhase {
    pub fn can_start(self) -> bool {
        matches!(self, FrameworkPhase::Idle | FrameworkPhase::Stopped)
    }
}

/// get_status 返回值
#[derive(Clone, Debug, Serialize)]
pub struct FrameworkStatus {
    pub is_running: bool,
    pub phase: FrameworkPhase,
    pub cycle_count: usize,
    pub config: FrameworkConfig,
    pub last_activity: DateTime<Utc>,
}
