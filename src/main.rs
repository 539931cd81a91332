//! NeuroCortex - SRDF 运行入口
//!
//! 入口：加载配置、初始化日志、运行 Trawler → Generator → Arbiter 循环，
//! 结束（达到 max_cycles 或收到 Ctrl+C / SIGTERM）后保存进度与分析报告。

use anyhow::Context;
use neurocortex::{
    config::{load_config, AppConfig},
    core::shutdown::ShutdownManager,
    observability,
    srdf::{BaselineEvaluator, Dataset},
    SrdfFramework,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = load_config(None);
    let cfg = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => AppConfig::default(),
    };

    // 日志：默认取配置中的 log_level，可通过 RUST_LOG 覆盖
    observability::init(&cfg.framework.log_level);
    if let Err(e) = loaded {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    let mut framework = SrdfFramework::new(cfg.framework.clone())
        .context("Failed to create framework")?
        .with_issue_thresholds(cfg.trawler);

    let shutdown = ShutdownManager::new(framework.handle());
    shutdown.install_signal_handlers();

    let model = BaselineEvaluator::new();
    let dataset = Dataset::default();

    let results = framework
        .start_evolution(&model, &dataset)
        .await
        .context("Evolution run failed")?;

    for result in &results {
        match &result.selected_solution {
            Some(selected) => tracing::info!(
                "Cycle {}: {} (score {:.3}, {})",
                result.cycle_number,
                selected.candidate.proposed_solution,
                selected.validation_score,
                selected.candidate.estimated_improvement
            ),
            None => tracing::info!("Cycle {}: no issues detected", result.cycle_number),
        }
    }

    framework
        .save_progress(&cfg.output.progress_path)
        .context("Failed to save progress")?;
    framework
        .trawler()
        .save_analysis_report(&cfg.output.analysis_report_path)
        .context("Failed to save analysis report")?;

    Ok(())
}
