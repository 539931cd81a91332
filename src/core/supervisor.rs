//! 循环监管：停止请求与可中断等待
//!
//! 持有 CancellationToken，stop 时立即唤醒循环间的等待；阶段通过 watch 通道发布，
//! 供 FrameworkHandle 在其他任务中查询。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::state::FrameworkPhase;

#[derive(Debug)]
pub struct CycleSupervisor {
    /// 每次运行开始与结束时替换为新 token
    stop_token: Mutex<CancellationToken>,
    phase_tx: watch::Sender<FrameworkPhase>,
    cycle_count: AtomicUsize,
}

impl CycleSupervisor {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(FrameworkPhase::Idle);
        Self {
            stop_token: Mutex::new(CancellationToken::new()),
            phase_tx,
            cycle_count: AtomicUsize::new(0),
        }
    }

    pub fn stop_token(&self) -> CancellationToken {
        self.lock_token().clone()
    }

    /// 请求停止；仅在 Running 时生效，返回是否被接受。
    /// 当前循环跑完后退出，循环间的等待会被立即打断
    pub fn request_stop(&self) -> bool {
        if self.phase() != FrameworkPhase::Running {
            tracing::debug!("Stop requested while {:?}, ignoring", self.phase());
            return false;
        }
        self.lock_token().cancel();
        true
    }

    pub fn stop_requested(&self) -> bool {
        self.lock_token().is_cancelled()
    }

    /// 换一个新的 token
    pub fn reset(&self) {
        *self.lock_token() = CancellationToken::new();
    }

    /// 等待 duration；被 stop 打断时返回 false
    pub async fn wait_or_stop(&self, duration: Duration) -> bool {
        let token = self.stop_token();
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = token.cancelled() => false,
        }
    }

    pub fn phase(&self) -> FrameworkPhase {
        *self.phase_tx.borrow()
    }

    pub fn set_phase(&self, phase: FrameworkPhase) {
        self.phase_tx.send_replace(phase);
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameworkPhase> {
        self.phase_tx.subscribe()
    }

    pub fn cycle_count(&self) -> usize {
        self.cycle_count.load(Ordering::SeqCst)
    }

    pub fn set_cycle_count(&self, count: usize) {
        self.cycle_count.store(count, Ordering::SeqCst);
    }

    fn lock_token(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        // token 本身不会处于不一致状态，锁中毒时直接取出内容
        self.stop_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CycleSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_completes_without_stop() {
        let supervisor = CycleSupervisor::new();
        assert!(supervisor.wait_or_stop(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_stop_interrupts_wait() {
        let supervisor = std::sync::Arc::new(CycleSupervisor::new());
        supervisor.set_phase(FrameworkPhase::Running);
        let waiter = {
            let supervisor = supervisor.clone();
            tokio::spawn(async move { supervisor.wait_or_stop(Duration::from_secs(3600)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        supervisor.request_stop();

        let finished = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait should be interrupted")
            .unwrap();
        assert!(!finished);
    }

    #[test]
    fn test_reset_clears_stop_request() {
        let supervisor = CycleSupervisor::new();
        supervisor.set_phase(FrameworkPhase::Running);
        let old = supervisor.stop_token();
        assert!(supervisor.request_stop());
        assert!(supervisor.stop_requested());
        supervisor.reset();
        assert!(!supervisor.stop_requested());
        assert!(old.is_cancelled());
    }

    #[test]
    fn test_stop_ignored_unless_running() {
        let supervisor = CycleSupervisor::new();
        assert!(!supervisor.request_stop());
        assert!(!supervisor.stop_requested());

        supervisor.set_phase(FrameworkPhase::Stopped);
        assert!(!supervisor.request_stop());
        assert!(!supervisor.stop_requested());
    }

    #[test]
    fn test_phase_broadcast() {
        let supervisor = CycleSupervisor::new();
        let rx = supervisor.subscribe();
        assert_eq!(supervisor.phase(), FrameworkPhase::Idle);
        supervisor.set_phase(FrameworkPhase::Running);
        assert_eq!(*rx.borrow(), FrameworkPhase::Running);
    }
}
