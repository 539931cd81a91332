use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::core::error::{Result, SrdfError};
use crate::srdf::types::{AnalysisResult, Candidate, Complexity, Finding, SolutionCategory};

const ACCURACY_KEYWORDS: &[&str] = &["accuracy", "precision", "f1"];
const RECALL_KEYWORDS: &[&str] = &["recall", "minority", "class"];
const SPEED_KEYWORDS: &[&str] = &["speed", "time", "slow"];

const ACCURACY_TEMPLATES: &[&str] = &[
    "GradientBoosting with hyperparameter optimization",
    "Neural Architecture Search for optimal structure",
    "Ensemble of diverse model types",
];
const RECALL_TEMPLATES: &[&str] = &[
    "SMOTE for class balancing",
    "Focal loss for imbalanced data",
    "Cost-sensitive learning approach",
];
const SPEED_TEMPLATES: &[&str] = &[
    "Model quantization for faster inference",
    "Architecture pruning for efficiency",
    "Knowledge distillation to smaller model",
];
pub const DEFAULT_SOLUTION: &str = "Default optimization";

pub const CONFIDENCE_RANGE: std::ops::RangeInclusive<f64> = 0.7..=0.95;
pub const IMPROVEMENT_PERCENT_RANGE: std::ops::RangeInclusive<u32> = 5..=20;

/// 按关键字归类问题，先匹配先得；都不匹配时归为 General
pub fn classify_issue(issue: &str) -> SolutionCategory {
    let lower = issue.to_lowercase();
    let matches = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if matches(ACCURACY_KEYWORDS) {
        SolutionCategory::Accuracy
    } else if matches(RECALL_KEYWORDS) {
        SolutionCategory::Recall
    } else if matches(SPEED_KEYWORDS) {
        SolutionCategory::Speed
    } else {
        SolutionCategory::General
    }
}

pub fn templates_for(category: SolutionCategory) -> &'static [&'static str] {
    match category {
        SolutionCategory::Accuracy => ACCURACY_TEMPLATES,
        SolutionCategory::Recall => RECALL_TEMPLATES,
        SolutionCategory::Speed => SPEED_TEMPLATES,
        SolutionCategory::General => &[DEFAULT_SOLUTION],
    }
}

/// 由 RNG 生成候选 ID，种子固定时可复现
pub(crate) fn seeded_id(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
}

pub struct Generator {
    rng: StdRng,
    generated_solutions: Vec<Candidate>,
}

impl Generator {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            generated_solutions: Vec::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub(crate) fn reseed(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    pub(crate) fn restore_history(&mut self, solutions: Vec<Candidate>) {
        self.generated_solutions = solutions;
    }

    /// 每条 finding 生成一个候选方案
    pub fn propose_solutions(&mut self, analysis: &AnalysisResult) -> Vec<Candidate> {
        self.propose_for(&analysis.findings)
    }

    /// 兼容两列表形式的分析结果；长度不一致时报错而不是截断
    pub fn propose_from_lists(
        &mut self,
        issues: &[String],
        recommendations: &[String],
    ) -> Result<Vec<Candidate>> {
        if issues.len() != recommendations.len() {
            return Err(SrdfError::MismatchedAnalysis {
                issues: issues.len(),
                recommendations: recommendations.len(),
            });
        }
        let findings: Vec<Finding> = issues
            .iter()
            .zip(recommendations)
            .map(|(i, r)| Finding::new(i.clone(), r.clone()))
            .collect();
        Ok(self.propose_for(&findings))
    }

    fn propose_for(&mut self, findings: &[Finding]) -> Vec<Candidate> {
        let solutions: Vec<Candidate> = findings
            .iter()
            .map(|f| self.generate_solution(f))
            .collect();
        self.generated_solutions.extend(solutions.iter().cloned());
        solutions
    }

    fn generate_solution(&mut self, finding: &Finding) -> Candidate {
        let category = classify_issue(&finding.issue);
        if category == SolutionCategory::General {
            tracing::warn!(
                "No solution category for issue '{}', using '{}'",
                finding.issue,
                DEFAULT_SOLUTION
            );
        }

        let proposed_solution = templates_for(category)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(DEFAULT_SOLUTION)
            .to_string();
        let complexity = Complexity::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Complexity::Medium);

        Candidate {
            id: seeded_id(&mut self.rng),
            issue: finding.issue.clone(),
            recommendation: finding.recommendation.clone(),
            category,
            proposed_solution,
            confidence_score: self.rng.gen_range(CONFIDENCE_RANGE),
            estimated_improvement: format!(
                "{}%",
                self.rng.gen_range(IMPROVEMENT_PERCENT_RANGE)
            ),
            complexity,
        }
    }

    pub fn get_solution_history(&self) -> &[Candidate] {
        &self.generated_solutions
    }
}
