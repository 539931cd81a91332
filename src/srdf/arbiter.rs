use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::core::error::{Result, SrdfError};
use crate::srdf::types::{
    Candidate, ImpactEstimate, PerformanceSnapshot, StabilityImpact, ValidatedCandidate,
    ValidationResult,
};

pub const DEFAULT_VALIDATION_THRESHOLD: f64 = 0.8;

/// accuracy 低于此值时更愿意尝试新方案
const POOR_ACCURACY: f64 = 0.7;
const POOR_ACCURACY_FACTOR: f64 = 1.1;

/// 验证得分：min(1, confidence × 复杂度因子 × 性能因子)
pub fn validation_score(candidate: &Candidate, current: &PerformanceSnapshot) -> f64 {
    let performance_factor = if current.accuracy < POOR_ACCURACY {
        POOR_ACCURACY_FACTOR
    } else {
        1.0
    };
    (candidate.confidence_score * candidate.complexity.factor() * performance_factor).min(1.0)
}

/// 返回得分最高者的下标；并列时取第一个
fn first_max<'a>(items: impl Iterator<Item = (usize, &'a ValidatedCandidate)>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, item) in items {
        match best {
            Some((_, score)) if item.validation_score <= score => {}
            _ => best = Some((idx, item.validation_score)),
        }
    }
    best.map(|(idx, _)| idx)
}

pub struct Arbiter {
    validation_threshold: f64,
    rng: StdRng,
    validation_history: Vec<ValidationResult>,
    selected_solutions: Vec<ValidatedCandidate>,
}

impl Arbiter {
    /// threshold 须在 [0,1]，由 FrameworkConfig::validate 保证
    pub fn new(validation_threshold: f64, rng: StdRng) -> Self {
        Self {
            validation_threshold,
            rng,
            validation_history: Vec::new(),
            selected_solutions: Vec::new(),
        }
    }

    pub fn with_seed(validation_threshold: f64, seed: u64) -> Self {
        Self::new(validation_threshold, StdRng::seed_from_u64(seed))
    }

    pub fn validation_threshold(&self) -> f64 {
        self.validation_threshold
    }

    pub(crate) fn set_validation_threshold(&mut self, threshold: f64) {
        self.validation_threshold = threshold;
    }

    pub(crate) fn reseed(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    /// 由验证记录重建两份历史
    pub(crate) fn restore_history(&mut self, history: Vec<ValidationResult>) {
        self.selected_solutions = history
            .iter()
            .map(|v| v.selected_solution.clone())
            .collect();
        self.validation_history = history;
    }

    pub fn validate_solutions(
        &mut self,
        candidates: &[Candidate],
        current_performance: &PerformanceSnapshot,
    ) -> Result<ValidationResult> {
        if candidates.is_empty() {
            return Err(SrdfError::EmptyCandidateSet);
        }

        let validated: Vec<ValidatedCandidate> = candidates
            .iter()
            .map(|c| self.validate_solution(c, current_performance))
            .collect();

        let passing = first_max(validated.iter().enumerate().filter(|(_, v)| v.is_valid));
        let (selected_idx, fallback) = match passing {
            Some(idx) => (idx, false),
            None => {
                let idx = first_max(validated.iter().enumerate())
                    .ok_or(SrdfError::EmptyCandidateSet)?;
                tracing::warn!(
                    "No candidate reached threshold {:.2}, falling back to '{}' (score {:.3})",
                    self.validation_threshold,
                    validated[idx].candidate.proposed_solution,
                    validated[idx].validation_score
                );
                (idx, true)
            }
        };
        let selected = validated[selected_idx].clone();

        let result = ValidationResult {
            timestamp: Utc::now(),
            validated_solutions: validated,
            selected_solution: selected.clone(),
            validation_threshold: self.validation_threshold,
            fallback,
        };

        self.validation_history.push(result.clone());
        self.selected_solutions.push(selected);

        Ok(result)
    }

    fn validate_solution(
        &mut self,
        candidate: &Candidate,
        current_performance: &PerformanceSnapshot,
    ) -> ValidatedCandidate {
        let score = validation_score(candidate, current_performance);
        tracing::debug!(
            "Candidate '{}' ({:?}) scored {:.3}",
            candidate.proposed_solution,
            candidate.complexity,
            score
        );

        ValidatedCandidate {
            candidate: candidate.clone(),
            validation_score: score,
            is_valid: score >= self.validation_threshold,
            expected_impact: self.estimate_impact(),
        }
    }

    fn estimate_impact(&mut self) -> ImpactEstimate {
        ImpactEstimate {
            accuracy_improvement: self.rng.gen_range(0.02..=0.15),
            speed_improvement: self.rng.gen_range(0.01..=0.10),
            stability_impact: StabilityImpact::ALL
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(StabilityImpact::Neutral),
        }
    }

    pub fn get_validation_history(&self) -> &[ValidationResult] {
        &self.validation_history
    }

    pub fn get_selected_solutions(&self) -> &[ValidatedCandidate] {
        &self.selected_solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srdf::types::{Complexity, SolutionCategory};

    fn candidate(id: &str, confidence: f64, complexity: Complexity) -> Candidate {
        Candidate {
            id: id.to_string(),
            issue: "Low accuracy".to_string(),
            recommendation: "Improve accuracy".to_string(),
            category: SolutionCategory::Accuracy,
            proposed_solution: format!("Solution {id}"),
            confidence_score: confidence,
            estimated_improvement: "10%".to_string(),
            complexity,
        }
    }

    fn performance(accuracy: f64) -> PerformanceSnapshot {
        PerformanceSnapshot {
            accuracy,
            precision: 0.8,
            recall: 0.8,
            f1_score: 0.8,
            inference_time: 0.05,
        }
    }

    #[test]
    fn test_default_threshold() {
        let arbiter = Arbiter::with_seed(DEFAULT_VALIDATION_THRESHOLD, 0);
        assert_eq!(arbiter.validation_threshold(), 0.8);
    }

    #[test]
    fn test_single_medium_candidate_selected() {
        let mut arbiter = Arbiter::with_seed(0.8, 0);
        let result = arbiter
            .validate_solutions(&[candidate("a", 0.9, Complexity::Medium)], &performance(0.75))
            .unwrap();

        assert!((result.selected_solution.validation_score - 0.9).abs() < 1e-12);
        assert!(result.selected_solution.is_valid);
        assert!(!result.fallback);
        assert_eq!(result.validated_solutions.len(), 1);
        assert_eq!(arbiter.get_validation_history().len(), 1);
        assert_eq!(arbiter.get_selected_solutions().len(), 1);
    }

    #[test]
    fn test_score_factors_and_clamp() {
        let low = candidate("low", 0.9, Complexity::Low);
        let high = candidate("high", 0.9, Complexity::High);
        assert_eq!(validation_score(&low, &performance(0.9)), 1.0);
        assert!((validation_score(&high, &performance(0.9)) - 0.72).abs() < 1e-12);
        assert!((validation_score(&high, &performance(0.6)) - 0.792).abs() < 1e-12);
    }

    #[test]
    fn test_best_passing_candidate_wins() {
        let mut arbiter = Arbiter::with_seed(0.8, 0);
        let candidates = vec![
            candidate("a", 0.85, Complexity::Medium),
            candidate("b", 0.8, Complexity::Low),
            candidate("c", 0.95, Complexity::High),
        ];
        let result = arbiter.validate_solutions(&candidates, &performance(0.8)).unwrap();
        assert_eq!(result.selected_solution.candidate.id, "b");
        assert!(!result.validated_solutions[2].is_valid);
    }

    #[test]
    fn test_fallback_to_least_bad() {
        let mut arbiter = Arbiter::with_seed(0.8, 0);
        let candidates = vec![
            candidate("a", 0.75, Complexity::High),
            candidate("b", 0.9, Complexity::High),
            candidate("c", 0.7, Complexity::High),
        ];
        let result = arbiter.validate_solutions(&candidates, &performance(0.8)).unwrap();
        assert!(result.fallback);
        assert!(!result.selected_solution.is_valid);
        assert_eq!(result.selected_solution.candidate.id, "b");
    }

    #[test]
    fn test_tie_break_first_occurrence() {
        let mut arbiter = Arbiter::with_seed(0.8, 0);
        let candidates = vec![
            candidate("first", 0.9, Complexity::Medium),
            candidate("second", 0.9, Complexity::Medium),
        ];
        for _ in 0..3 {
            let result = arbiter.validate_solutions(&candidates, &performance(0.8)).unwrap();
            assert_eq!(result.selected_solution.candidate.id, "first");
        }
    }

    #[test]
    fn test_empty_candidate_set() {
        let mut arbiter = Arbiter::with_seed(0.8, 0);
        let err = arbiter.validate_solutions(&[], &performance(0.8)).unwrap_err();
        assert!(matches!(err, SrdfError::EmptyCandidateSet));
        assert!(arbiter.get_validation_history().is_empty());
    }

    #[test]
    fn test_impact_ranges() {
        let mut arbiter = Arbiter::with_seed(0.0, 9);
        let candidates: Vec<Candidate> = (0..50)
            .map(|i| candidate(&i.to_string(), 0.8, Complexity::Medium))
            .collect();
        let result = arbiter.validate_solutions(&candidates, &performance(0.8)).unwrap();
        for v in &result.validated_solutions {
            assert!((0.02..=0.15).contains(&v.expected_impact.accuracy_improvement));
            assert!((0.01..=0.10).contains(&v.expected_impact.speed_improvement));
            assert!(v.is_valid);
        }
    }

    #[test]
    fn test_selection_property_over_thresholds() {
        let candidates = vec![
            candidate("a", 0.7, Complexity::Low),
            candidate("b", 0.95, Complexity::High),
            candidate("c", 0.82, Complexity::Medium),
            candidate("d", 0.7, Complexity::High),
        ];
        let perf = performance(0.8);
        for step in 0..=20 {
            let t = step as f64 / 20.0;
            let mut arbiter = Arbiter::with_seed(t, 0);
            let result = arbiter.validate_solutions(&candidates, &perf).unwrap();
            let scores: Vec<f64> = candidates.iter().map(|c| validation_score(c, &perf)).collect();
            let passing_max = scores
                .iter()
                .copied()
                .filter(|s| *s >= t)
                .fold(f64::NEG_INFINITY, f64::max);
            let overall_max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let expected = if passing_max.is_finite() { passing_max } else { overall_max };
            assert_eq!(result.selected_solution.validation_score, expected);
        }
    }
}
