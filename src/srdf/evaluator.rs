//! 模型评估抽象
//!
//! Trawler 只通过 ModelEvaluator 获取指标，本身不关心模型与数据是否匹配。
//! BaselineEvaluator 返回固定指标；PredictionEvaluator 基于预测函数计算真实的分类指标。

use std::collections::BTreeSet;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SrdfError};
use crate::srdf::types::PerformanceSnapshot;

/// 分类数据集：每行一个样本，labels 与 samples 按下标对应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub samples: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
}

impl Dataset {
    pub fn new(samples: Vec<Vec<f64>>, labels: Vec<i64>) -> Self {
        Self { samples, labels }
    }

    pub fn len(&self) -> usize {
        self.samples.len().min(self.labels.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 模型评估 trait：给定数据集返回一次性能快照
#[async_trait]
pub trait ModelEvaluator: Send + Sync {
    /// 写入 AnalysisResult.model_type
    fn model_type(&self) -> &str;

    async fn evaluate(&self, dataset: &Dataset) -> Result<PerformanceSnapshot>;
}

/// 固定指标，与输入无关
#[derive(Debug, Clone)]
pub struct BaselineEvaluator {
    snapshot: PerformanceSnapshot,
}

impl BaselineEvaluator {
    pub const BASELINE: PerformanceSnapshot = PerformanceSnapshot {
        accuracy: 0.85,
        precision: 0.82,
        recall: 0.78,
        f1_score: 0.80,
        inference_time: 0.15,
    };

    pub fn new() -> Self {
        Self {
            snapshot: Self::BASELINE,
        }
    }

    /// 自定义固定指标（测试与演示用）
    pub fn with_snapshot(snapshot: PerformanceSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Default for BaselineEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelEvaluator for BaselineEvaluator {
    fn model_type(&self) -> &str {
        "BaselineModel"
    }

    async fn evaluate(&self, _dataset: &Dataset) -> Result<PerformanceSnapshot> {
        Ok(self.snapshot)
    }
}

/// 包装一个预测函数，计算 accuracy 与宏平均 precision / recall / F1
pub struct PredictionEvaluator<F> {
    name: String,
    predict: F,
}

impl<F> PredictionEvaluator<F>
where
    F: Fn(&[f64]) -> i64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, predict: F) -> Self {
        Self {
            name: name.into(),
            predict,
        }
    }
}

impl<F> std::fmt::Debug for PredictionEvaluator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionEvaluator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> ModelEvaluator for PredictionEvaluator<F>
where
    F: Fn(&[f64]) -> i64 + Send + Sync,
{
    fn model_type(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, dataset: &Dataset) -> Result<PerformanceSnapshot> {
        if dataset.is_empty() {
            return Err(SrdfError::Evaluation(
                "dataset has no labelled samples".to_string(),
            ));
        }
        if dataset.samples.len() != dataset.labels.len() {
            tracing::warn!(
                "Dataset has {} samples but {} labels, evaluating the first {}",
                dataset.samples.len(),
                dataset.labels.len(),
                dataset.len()
            );
        }

        let n = dataset.len();
        let started = Instant::now();
        let predictions: Vec<i64> = dataset.samples[..n]
            .iter()
            .map(|sample| (self.predict)(sample))
            .collect();
        let inference_time = started.elapsed().as_secs_f64() / n as f64;

        Ok(classification_metrics(
            &dataset.labels[..n],
            &predictions,
            inference_time,
        ))
    }
}

/// labels 与 predictions 等长；类别集合取两者并集
pub(crate) fn classification_metrics(
    labels: &[i64],
    predictions: &[i64],
    inference_time: f64,
) -> PerformanceSnapshot {
    let n = labels.len();
    let correct = labels
        .iter()
        .zip(predictions)
        .filter(|(l, p)| l == p)
        .count();

    let classes: BTreeSet<i64> = labels.iter().chain(predictions).copied().collect();
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;

    for &class in &classes {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (&label, &pred) in labels.iter().zip(predictions) {
            match (label == class, pred == class) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        precision_sum += precision;
        recall_sum += recall;
        f1_sum += f1;
    }

    let class_count = classes.len().max(1) as f64;
    PerformanceSnapshot {
        accuracy: ratio(correct, n),
        precision: precision_sum / class_count,
        recall: recall_sum / class_count,
        f1_score: f1_sum / class_count,
        inference_time,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_baseline_ignores_input() {
        let evaluator = BaselineEvaluator::new();
        let empty = evaluator.evaluate(&Dataset::default()).await.unwrap();
        let data = Dataset::new(vec![vec![1.0, 2.0]], vec![1]);
        let filled = evaluator.evaluate(&data).await.unwrap();
        assert_eq!(empty, filled);
        assert_eq!(empty.accuracy, 0.85);
        assert_eq!(empty.inference_time, 0.15);
    }

    #[test]
    fn test_classification_metrics_perfect() {
        let m = classification_metrics(&[0, 1, 1, 0], &[0, 1, 1, 0], 0.0);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
    }

    #[test]
    fn test_classification_metrics_constant_predictor() {
        // 全部预测为 0：class 0 precision 0.5 / recall 1.0，class 1 全为 0
        let m = classification_metrics(&[0, 1, 0, 1], &[0, 0, 0, 0], 0.0);
        assert!((m.accuracy - 0.5).abs() < 1e-9);
        assert!((m.precision - 0.25).abs() < 1e-9);
        assert!((m.recall - 0.5).abs() < 1e-9);
        let f1_class0 = 2.0 * 0.5 * 1.0 / 1.5;
        assert!((m.f1_score - f1_class0 / 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_prediction_evaluator_empty_dataset() {
        let evaluator = PredictionEvaluator::new("Zero", |_: &[f64]| 0);
        let err = evaluator.evaluate(&Dataset::default()).await.unwrap_err();
        assert!(matches!(err, SrdfError::Evaluation(_)));
    }

    #[tokio::test]
    async fn test_prediction_evaluator_threshold_model() {
        let evaluator = PredictionEvaluator::new("Threshold", |x: &[f64]| i64::from(x[0] > 0.5));
        let data = Dataset::new(
            vec![vec![0.1], vec![0.9], vec![0.7], vec![0.2]],
            vec![0, 1, 0, 0],
        );
        let m = evaluator.evaluate(&data).await.unwrap();
        assert!((m.accuracy - 0.75).abs() < 1e-9);
        assert!(m.inference_time >= 0.0);
        assert_eq!(evaluator.model_type(), "Threshold");
    }
}
