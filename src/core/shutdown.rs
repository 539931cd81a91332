//! 优雅关闭处理
//!
//! 收到 Ctrl+C / SIGTERM 时向运行中的框架发出停止请求：正在进行的循环跑完，
//! 循环间的等待立即结束，随后调用方可以保存进度。框架未运行时请求被忽略。

use tokio::sync::broadcast;

use crate::core::framework::FrameworkHandle;

/// 关闭原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户发起的退出 (Ctrl+C)
    UserInitiated,
    /// SIGTERM 信号
    Signal,
}

/// 关闭信号管理器：把关闭请求转发给 FrameworkHandle，并广播原因
#[derive(Clone, Debug)]
pub struct ShutdownManager {
    handle: FrameworkHandle,
    reason_tx: broadcast::Sender<ShutdownReason>,
}

impl ShutdownManager {
    pub fn new(handle: FrameworkHandle) -> Self {
        let (reason_tx, _) = broadcast::channel(1);
        Self { handle, reason_tx }
    }

    /// 触发关闭
    pub fn shutdown(&self, reason: ShutdownReason) {
        tracing::info!("Shutdown requested ({:?}), stopping evolution", reason);
        let _ = self.reason_tx.send(reason);
        if !self.handle.stop() {
            tracing::debug!("Framework not running, nothing to stop");
        }
    }

    /// 订阅关闭原因
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.reason_tx.subscribe()
    }

    /// 安装系统信号处理器 (Ctrl+C, SIGTERM)
    pub fn install_signal_handlers(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                manager.shutdown(ShutdownReason::UserInitiated);
            }
        });

        #[cfg(unix)]
        {
            let manager = self.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    manager.shutdown(ShutdownReason::Signal);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{ConfigOverrides, FrameworkConfig};
    use crate::core::framework::SrdfFramework;
    use crate::core::state::FrameworkPhase;
    use crate::srdf::evaluator::{BaselineEvaluator, Dataset};

    #[tokio::test]
    async fn test_shutdown_stops_running_framework() {
        let config = FrameworkConfig::default()
            .with_overrides(ConfigOverrides {
                max_cycles: Some(5),
                cycle_interval: Some(3600),
                seed: Some(1),
                ..Default::default()
            })
            .unwrap();
        let mut framework = SrdfFramework::new(config).unwrap();
        let handle = framework.handle();
        let manager = ShutdownManager::new(framework.handle());
        let mut rx = manager.subscribe();

        let task = tokio::spawn(async move {
            let results = framework
                .start_evolution(&BaselineEvaluator::new(), &Dataset::default())
                .await;
            (framework, results)
        });
        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.cycle_count() < 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first cycle should complete");

        manager.shutdown(ShutdownReason::Signal);
        assert_eq!(rx.try_recv().unwrap(), ShutdownReason::Signal);

        let (framework, results) = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("shutdown should end the run")
            .unwrap();
        assert_eq!(results.unwrap().len(), 1);
        assert_eq!(framework.get_status().phase, FrameworkPhase::Stopped);
    }

    #[test]
    fn test_shutdown_while_idle_keeps_framework_idle() {
        let framework = SrdfFramework::new(FrameworkConfig::default()).unwrap();
        let manager = ShutdownManager::new(framework.handle());

        manager.shutdown(ShutdownReason::UserInitiated);
        assert_eq!(framework.get_status().phase, FrameworkPhase::Idle);
    }
}
