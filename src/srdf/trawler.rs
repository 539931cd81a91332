use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::persistence::write_json;
use crate::srdf::evaluator::{BaselineEvaluator, Dataset, ModelEvaluator};
use crate::srdf::types::{AnalysisResult, Finding, PerformanceSnapshot};

pub const LOW_ACCURACY_ISSUE: &str = "Low accuracy - needs improvement";
pub const POOR_RECALL_ISSUE: &str = "Poor recall on minority classes";
pub const SLOW_INFERENCE_ISSUE: &str = "Slow inference speed";

const ACCURACY_RECOMMENDATION: &str = "Try ensemble methods or architecture search";
const RECALL_RECOMMENDATION: &str = "Apply class balancing techniques";
const SPEED_RECOMMENDATION: &str = "Optimize model architecture or use quantization";

/// 问题判定阈值：accuracy / recall 低于阈值、inference_time 高于阈值时报告问题
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueThresholds {
    pub min_accuracy: f64,
    pub min_recall: f64,
    pub max_inference_time: f64,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            min_accuracy: 0.9,
            min_recall: 0.8,
            max_inference_time: 0.1,
        }
    }
}

pub struct Trawler {
    thresholds: IssueThresholds,
    analysis_history: Vec<AnalysisResult>,
    last_analysis_time: Option<DateTime<Utc>>,
}

impl Trawler {
    pub fn new() -> Self {
        Self::with_thresholds(IssueThresholds::default())
    }

    pub fn with_thresholds(thresholds: IssueThresholds) -> Self {
        Self {
            thresholds,
            analysis_history: Vec::new(),
            last_analysis_time: None,
        }
    }

    pub async fn analyze_performance(
        &mut self,
        model: &dyn ModelEvaluator,
        dataset: &Dataset,
    ) -> AnalysisResult {
        let analysis_time = Utc::now();

        let performance_metrics = match model.evaluate(dataset).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    "Evaluation of {} failed ({}), using baseline metrics",
                    model.model_type(),
                    e
                );
                BaselineEvaluator::BASELINE
            }
        };
        let findings = self.identify_findings(&performance_metrics);

        let result = AnalysisResult {
            timestamp: analysis_time,
            performance_metrics,
            findings,
            model_type: model.model_type().to_string(),
        };

        tracing::debug!(
            "Analysis of {} found {} issues",
            result.model_type,
            result.findings.len()
        );

        self.analysis_history.push(result.clone());
        self.last_analysis_time = Some(analysis_time);

        result
    }

    pub fn identify_findings(&self, metrics: &PerformanceSnapshot) -> Vec<Finding> {
        let mut findings = Vec::new();

        if metrics.accuracy < self.thresholds.min_accuracy {
            findings.push(Finding::new(LOW_ACCURACY_ISSUE, ACCURACY_RECOMMENDATION));
        }
        if metrics.recall < self.thresholds.min_recall {
            findings.push(Finding::new(POOR_RECALL_ISSUE, RECALL_RECOMMENDATION));
        }
        if metrics.inference_time > self.thresholds.max_inference_time {
            findings.push(Finding::new(SLOW_INFERENCE_ISSUE, SPEED_RECOMMENDATION));
        }

        findings
    }

    pub fn thresholds(&self) -> &IssueThresholds {
        &self.thresholds
    }

    pub(crate) fn set_thresholds(&mut self, thresholds: IssueThresholds) {
        self.thresholds = thresholds;
    }

    /// 用已保存的分析结果替换历史
    pub(crate) fn restore_history(&mut self, history: Vec<AnalysisResult>) {
        self.last_analysis_time = history.last().map(|a| a.timestamp);
        self.analysis_history = history;
    }

    pub fn get_analysis_history(&self) -> &[AnalysisResult] {
        &self.analysis_history
    }

    pub fn last_analysis_time(&self) -> Option<DateTime<Utc>> {
        self.last_analysis_time
    }

    /// 将全部分析历史写成 JSON 数组
    pub fn save_analysis_report(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &self.analysis_history)
    }
}

impl Default for Trawler {
    fn default() -> Self {
        Self::new()
    }
}
