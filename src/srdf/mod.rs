pub mod arbiter;
pub mod evaluator;
pub mod generator;
pub mod trawler;
pub mod types;

pub use arbiter::Arbiter;
pub use evaluator::{BaselineEvaluator, Dataset, ModelEvaluator, PredictionEvaluator};
pub use generator::Generator;
pub use trawler::{IssueThresholds, Trawler};
pub use types::{
    AnalysisResult, Candidate, Complexity, CycleResult, Finding, ImpactEstimate,
    ImplementationResult, ImplementationStatus, PerformanceSnapshot, SolutionCategory,
    StabilityImpact, ValidatedCandidate, ValidationResult,
};
