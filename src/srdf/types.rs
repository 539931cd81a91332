use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// 单样本平均推理耗时（秒）
    pub inference_time: f64,
}

impl PerformanceSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "accuracy" => Some(self.accuracy),
            "precision" => Some(self.precision),
            "recall" => Some(self.recall),
            "f1_score" | "f1" => Some(self.f1_score),
            "inference_time" => Some(self.inference_time),
            _ => None,
        }
    }

    /// 按配置的 performance_metrics 投影；未知指标名跳过并告警
    pub fn tracked(&self, names: &[String]) -> Vec<(String, f64)> {
        names
            .iter()
            .filter_map(|name| match self.get(name) {
                Some(value) => Some((name.clone(), value)),
                None => {
                    tracing::warn!("Unknown performance metric '{}', skipping", name);
                    None
                }
            })
            .collect()
    }
}

/// 一条分析结论：问题与对应建议成对出现，不会出现长度错位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub issue: String,
    pub recommendation: String,
}

impl Finding {
    pub fn new(issue: impl Into<String>, recommendation: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            recommendation: recommendation.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub timestamp: DateTime<Utc>,
    pub performance_metrics: PerformanceSnapshot,
    pub findings: Vec<Finding>,
    pub model_type: String,
}

impl AnalysisResult {
    pub fn issues(&self) -> impl Iterator<Item = &str> {
        self.findings.iter().map(|f| f.issue.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionCategory {
    Accuracy,
    Recall,
    Speed,
    General,
}

impl std::fmt::Display for SolutionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionCategory::Accuracy => write!(f, "accuracy"),
            SolutionCategory::Recall => write!(f, "recall"),
            SolutionCategory::Speed => write!(f, "speed"),
            SolutionCategory::General => write!(f, "general"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Low, Complexity::Medium, Complexity::High];

    /// 复杂度越低，验证得分越高
    pub fn factor(self) -> f64 {
        match self {
            Complexity::Low => 1.2,
            Complexity::Medium => 1.0,
            Complexity::High => 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub issue: String,
    pub recommendation: String,
    pub category: SolutionCategory,
    pub proposed_solution: String,
    pub confidence_score: f64,
    pub estimated_improvement: String,
    pub complexity: Complexity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityImpact {
    Improved,
    Neutral,
    Reduced,
}

impl StabilityImpact {
    pub const ALL: [StabilityImpact; 3] = [
        StabilityImpact::Improved,
        StabilityImpact::Neutral,
        StabilityImpact::Reduced,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub accuracy_improvement: f64,
    pub speed_improvement: f64,
    pub stability_impact: StabilityImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub validation_score: f64,
    pub is_valid: bool,
    pub expected_impact: ImpactEstimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub timestamp: DateTime<Utc>,
    pub validated_solutions: Vec<ValidatedCandidate>,
    pub selected_solution: ValidatedCandidate,
    pub validation_threshold: f64,
    /// 没有候选通过阈值时为 true，selected_solution 是得分最高的未通过者
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationStatus {
    Success,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationResult {
    pub status: ImplementationStatus,
    pub implementation_time: f64,
    pub changes_applied: bool,
    pub rollback_possible: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle_number: usize,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub analysis_results: AnalysisResult,
    pub proposed_solutions: Vec<Candidate>,
    pub validation_results: Option<ValidationResult>,
    pub implementation_result: ImplementationResult,
    pub selected_solution: Option<ValidatedCandidate>,
}

impl CycleResult {
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_solution
            .as_ref()
            .map(|s| s.candidate.id.as_str())
    }
}
