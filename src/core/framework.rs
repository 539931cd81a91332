//! SRDF 编排器：Trawler → Generator → Arbiter → 模拟实施 的循环
//!
//! 每轮循环完整记录到 cycle_history；循环之间的等待可被 stop 立即打断。
//! 其他任务通过 FrameworkHandle 请求停止或查询状态。

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;

use crate::config::{ConfigOverrides, FrameworkConfig};
use crate::core::error::{Result, SrdfError};
use crate::core::persistence::ProgressFile;
use crate::core::state::{FrameworkPhase, FrameworkStatus};
use crate::core::supervisor::CycleSupervisor;
use crate::srdf::arbiter::Arbiter;
use crate::srdf::evaluator::{Dataset, ModelEvaluator};
use crate::srdf::generator::Generator;
use crate::srdf::trawler::{IssueThresholds, Trawler};
use crate::srdf::types::{
    CycleResult, ImplementationResult, ImplementationStatus, ValidatedCandidate,
};

/// 可跨任务克隆的控制句柄
#[derive(Clone, Debug)]
pub struct FrameworkHandle {
    supervisor: Arc<CycleSupervisor>,
}

impl FrameworkHandle {
    /// 仅在运行中生效；返回请求是否被接受
    pub fn stop(&self) -> bool {
        self.supervisor.request_stop()
    }

    pub fn phase(&self) -> FrameworkPhase {
        self.supervisor.phase()
    }

    pub fn is_running(&self) -> bool {
        self.phase() == FrameworkPhase::Running
    }

    pub fn cycle_count(&self) -> usize {
        self.supervisor.cycle_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameworkPhase> {
        self.supervisor.subscribe()
    }
}

/// 一次运行的守卫：正常结束或 future 被中途丢弃时都复位停止令牌并离开 Running
struct RunGuard {
    supervisor: Arc<CycleSupervisor>,
    /// 正常结束时的终态；None 表示运行被中途取消
    outcome: Option<FrameworkPhase>,
}

impl RunGuard {
    fn enter(supervisor: &Arc<CycleSupervisor>) -> Self {
        supervisor.reset();
        supervisor.set_phase(FrameworkPhase::Running);
        Self {
            supervisor: Arc::clone(supervisor),
            outcome: None,
        }
    }

    fn finish(mut self, phase: FrameworkPhase) {
        self.outcome = Some(phase);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let phase = match self.outcome {
            Some(phase) => phase,
            None => {
                tracing::warn!("Evolution run cancelled before completion");
                FrameworkPhase::Stopped
            }
        };
        self.supervisor.reset();
        self.supervisor.set_phase(phase);
    }
}

pub struct SrdfFramework {
    config: FrameworkConfig,
    trawler: Trawler,
    generator: Generator,
    arbiter: Arbiter,
    /// 模拟实施用
    rng: StdRng,
    cycle_history: Vec<CycleResult>,
    supervisor: Arc<CycleSupervisor>,
}

impl SrdfFramework {
    pub fn new(config: FrameworkConfig) -> Result<Self> {
        Self::with_history(config, Vec::new())
    }

    /// 从已保存的进度恢复：循环历史与计数沿用文件内容，各阶段历史由循环记录重建
    pub fn from_progress(progress: ProgressFile) -> Result<Self> {
        let mut framework = Self::with_history(progress.config, progress.cycle_history)?;

        let history = &framework.cycle_history;
        framework
            .trawler
            .restore_history(history.iter().map(|c| c.analysis_results.clone()).collect());
        framework.generator.restore_history(
            history
                .iter()
                .flat_map(|c| c.proposed_solutions.iter().cloned())
                .collect(),
        );
        framework.arbiter.restore_history(
            history
                .iter()
                .filter_map(|c| c.validation_results.clone())
                .collect(),
        );

        tracing::info!("Resumed from progress with {} cycles", history.len());
        Ok(framework)
    }

    fn with_history(config: FrameworkConfig, cycle_history: Vec<CycleResult>) -> Result<Self> {
        config.validate()?;

        let mut master = master_rng(config.seed);
        let generator = Generator::new(StdRng::seed_from_u64(master.gen()));
        let arbiter = Arbiter::new(
            config.validation_threshold,
            StdRng::seed_from_u64(master.gen()),
        );
        let rng = StdRng::seed_from_u64(master.gen());

        let supervisor = Arc::new(CycleSupervisor::new());
        supervisor.set_cycle_count(cycle_history.len());

        Ok(Self {
            config,
            trawler: Trawler::new(),
            generator,
            arbiter,
            rng,
            cycle_history,
            supervisor,
        })
    }

    /// 替换问题判定阈值，分析历史保留
    pub fn with_issue_thresholds(mut self, thresholds: IssueThresholds) -> Self {
        self.trawler.set_thresholds(thresholds);
        self
    }

    pub fn handle(&self) -> FrameworkHandle {
        FrameworkHandle {
            supervisor: Arc::clone(&self.supervisor),
        }
    }

    /// 运行至多 max_cycles 轮；stop 后在当前循环结束时退出。
    /// 返回的 future 被丢弃时框架进入 Stopped，可以再次启动
    pub async fn start_evolution(
        &mut self,
        model: &dyn ModelEvaluator,
        dataset: &Dataset,
    ) -> Result<Vec<CycleResult>> {
        let phase = self.supervisor.phase();
        if !phase.can_start() {
            return Err(SrdfError::AlreadyRunning);
        }
        let guard = RunGuard::enter(&self.supervisor);

        tracing::info!(
            max_cycles = self.config.max_cycles,
            cycle_interval = self.config.cycle_interval,
            validation_threshold = self.config.validation_threshold,
            "Starting NeuroCortex SRDF evolution"
        );

        let max_cycles = self.config.max_cycles;
        let interval = Duration::from_secs(self.config.cycle_interval);
        let mut results = Vec::new();
        let mut stopped = false;

        for cycle in 0..max_cycles {
            if self.supervisor.stop_requested() {
                stopped = true;
                break;
            }

            let result = self.run_cycle(model, dataset).await;
            tracing::info!(
                "Cycle {}/{} completed, selected: {}",
                cycle + 1,
                max_cycles,
                result
                    .selected_solution
                    .as_ref()
                    .map(|s| s.candidate.proposed_solution.as_str())
                    .unwrap_or("(none)")
            );
            results.push(result);

            let last = cycle + 1 == max_cycles;
            if !last && !interval.is_zero() && !self.supervisor.wait_or_stop(interval).await {
                stopped = true;
                break;
            }
        }

        let stopped = stopped || self.supervisor.stop_requested();
        guard.finish(if stopped {
            FrameworkPhase::Stopped
        } else {
            FrameworkPhase::Idle
        });

        tracing::info!(
            "Evolution {} after {} cycles",
            if stopped { "stopped" } else { "finished" },
            results.len()
        );

        Ok(results)
    }

    /// 执行一轮完整循环并追加到历史
    pub async fn run_cycle(
        &mut self,
        model: &dyn ModelEvaluator,
        dataset: &Dataset,
    ) -> CycleResult {
        let start_time = Utc::now();
        let started = Instant::now();
        let cycle_number = self.cycle_history.len();

        let analysis = self.trawler.analyze_performance(model, dataset).await;
        for (name, value) in analysis
            .performance_metrics
            .tracked(&self.config.performance_metrics)
        {
            tracing::debug!(metric = %name, value, "Cycle {} metric", cycle_number);
        }

        let solutions = self.generator.propose_solutions(&analysis);

        let validation = if solutions.is_empty() {
            tracing::info!("No issues detected in cycle {}, skipping validation", cycle_number);
            None
        } else {
            match self
                .arbiter
                .validate_solutions(&solutions, &analysis.performance_metrics)
            {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Validation failed in cycle {}: {}", cycle_number, e);
                    None
                }
            }
        };

        let selected = validation.as_ref().map(|v| v.selected_solution.clone());
        let implementation_result = self.implement_solution(selected.as_ref());

        let result = CycleResult {
            cycle_number,
            start_time,
            duration_seconds: started.elapsed().as_secs_f64(),
            analysis_results: analysis,
            proposed_solutions: solutions,
            validation_results: validation,
            implementation_result,
            selected_solution: selected,
        };

        self.cycle_history.push(result.clone());
        self.supervisor.set_cycle_count(self.cycle_history.len());

        result
    }

    /// 模拟实施：不会真正修改模型
    fn implement_solution(&mut self, solution: Option<&ValidatedCandidate>) -> ImplementationResult {
        match solution {
            Some(selected) => ImplementationResult {
                status: ImplementationStatus::Success,
                implementation_time: self.rng.gen_range(1.0..=5.0),
                changes_applied: true,
                rollback_possible: true,
                notes: format!("Implemented {}", selected.candidate.proposed_solution),
            },
            None => ImplementationResult {
                status: ImplementationStatus::Skipped,
                implementation_time: 0.0,
                changes_applied: false,
                rollback_possible: false,
                notes: "Nothing to implement".to_string(),
            },
        }
    }

    pub fn stop_evolution(&self) {
        if self.supervisor.request_stop() {
            tracing::info!("Evolution stop requested");
        }
    }

    pub fn get_status(&self) -> FrameworkStatus {
        let phase = self.supervisor.phase();
        FrameworkStatus {
            is_running: phase == FrameworkPhase::Running,
            phase,
            cycle_count: self.cycle_history.len(),
            config: self.config.clone(),
            last_activity: Utc::now(),
        }
    }

    pub fn progress(&self) -> ProgressFile {
        ProgressFile {
            cycle_history: self.cycle_history.clone(),
            config: self.config.clone(),
            save_time: Utc::now(),
        }
    }

    pub fn save_progress(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.progress().save(path)?;
        tracing::info!("Progress saved to {}", path.display());
        Ok(())
    }

    /// 派生新配置并应用；阈值与种子变化会同步到各阶段，历史保留
    pub fn load_config(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if self.supervisor.phase() == FrameworkPhase::Running {
            return Err(SrdfError::AlreadyRunning);
        }
        let derived = self.config.with_overrides(overrides)?;

        self.arbiter
            .set_validation_threshold(derived.validation_threshold);
        if derived.seed.is_some() && derived.seed != self.config.seed {
            let mut master = master_rng(derived.seed);
            self.generator
                .reseed(StdRng::seed_from_u64(master.gen()));
            self.arbiter.reseed(StdRng::seed_from_u64(master.gen()));
            self.rng = StdRng::seed_from_u64(master.gen());
        }

        self.config = derived;
        tracing::info!("Configuration updated");
        Ok(())
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn get_cycle_history(&self) -> &[CycleResult] {
        &self.cycle_history
    }

    pub fn trawler(&self) -> &Trawler {
        &self.trawler
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }
}

fn master_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
