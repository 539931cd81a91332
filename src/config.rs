//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `NEUROCORTEX__*` 覆盖（双下划线表示嵌套，如 `NEUROCORTEX__FRAMEWORK__MAX_CYCLES=3`）。
//! FrameworkConfig 是不可变值：修改配置通过 `with_overrides` 派生新值，而不是原地更新。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SrdfError};
use crate::core::persistence::{DEFAULT_ANALYSIS_REPORT, DEFAULT_PROGRESS_FILE};
use crate::srdf::trawler::IssueThresholds;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub framework: FrameworkConfig,
    pub trawler: IssueThresholds,
    pub output: OutputSection,
}

/// [framework] 段：循环间隔、验证阈值、最大循环数等
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// 两次循环之间的等待（秒），0 表示不等待
    pub cycle_interval: u64,
    /// Arbiter 验证阈值，须在 [0,1]
    pub validation_threshold: f64,
    pub max_cycles: usize,
    pub performance_metrics: Vec<String>,
    /// RUST_LOG 未设置时使用
    pub log_level: String,
    /// 随机种子；未设置时从系统熵初始化
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            cycle_interval: 3600,
            validation_threshold: 0.8,
            max_cycles: 100,
            performance_metrics: default_performance_metrics(),
            log_level: "info".to_string(),
            seed: None,
        }
    }
}

fn default_performance_metrics() -> Vec<String> {
    ["accuracy", "precision", "recall", "f1_score"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// 部分覆盖：只有 Some 的字段会替换
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub cycle_interval: Option<u64>,
    pub validation_threshold: Option<f64>,
    pub max_cycles: Option<usize>,
    pub performance_metrics: Option<Vec<String>>,
    pub log_level: Option<String>,
    pub seed: Option<u64>,
}

impl FrameworkConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.validation_threshold) {
            return Err(SrdfError::InvalidConfiguration(format!(
                "validation_threshold must be within [0, 1], got {}",
                self.validation_threshold
            )));
        }
        if self.max_cycles == 0 {
            return Err(SrdfError::InvalidConfiguration(
                "max_cycles must be positive".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(SrdfError::InvalidConfiguration(
                "log_level must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// 派生一份应用了覆盖项的新配置，并校验
    pub fn with_overrides(&self, overrides: ConfigOverrides) -> Result<Self> {
        let derived = Self {
            cycle_interval: overrides.cycle_interval.unwrap_or(self.cycle_interval),
            validation_threshold: overrides
                .validation_threshold
                .unwrap_or(self.validation_threshold),
            max_cycles: overrides.max_cycles.unwrap_or(self.max_cycles),
            performance_metrics: overrides
                .performance_metrics
                .unwrap_or_else(|| self.performance_metrics.clone()),
            log_level: overrides.log_level.unwrap_or_else(|| self.log_level.clone()),
            seed: overrides.seed.or(self.seed),
        };
        derived.validate()?;
        Ok(derived)
    }
}

/// [output] 段：进度文件与分析报告路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub progress_path: PathBuf,
    pub analysis_report_path: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            progress_path: PathBuf::from(DEFAULT_PROGRESS_FILE),
            analysis_report_path: PathBuf::from(DEFAULT_ANALYSIS_REPORT),
        }
    }
}

/// 从 config 目录加载配置，环境变量 NEUROCORTEX__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 NEUROCORTEX__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("NEUROCORTEX")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.framework.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FrameworkConfig::default();
        assert_eq!(cfg.cycle_interval, 3600);
        assert_eq!(cfg.validation_threshold, 0.8);
        assert_eq!(cfg.max_cycles, 100);
        assert_eq!(
            cfg.performance_metrics,
            vec!["accuracy", "precision", "recall", "f1_score"]
        );
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        let base = FrameworkConfig::default();
        for bad in [-0.1, 1.5, f64::NAN] {
            let err = base
                .with_overrides(ConfigOverrides {
                    validation_threshold: Some(bad),
                    ..Default::default()
                })
                .unwrap_err();
            assert!(matches!(err, SrdfError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_zero_max_cycles_rejected() {
        let err = FrameworkConfig::default()
            .with_overrides(ConfigOverrides {
                max_cycles: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, SrdfError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_with_overrides_leaves_original_untouched() {
        let base = FrameworkConfig::default();
        let derived = base
            .with_overrides(ConfigOverrides {
                max_cycles: Some(3),
                cycle_interval: Some(0),
                seed: Some(11),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(derived.max_cycles, 3);
        assert_eq!(derived.cycle_interval, 0);
        assert_eq!(derived.seed, Some(11));
        assert_eq!(derived.validation_threshold, base.validation_threshold);
        assert_eq!(base.max_cycles, 100);
        assert_eq!(base.seed, None);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[framework]\nmax_cycles = 5\nvalidation_threshold = 0.6\n\n[trawler]\nmin_accuracy = 0.95\n",
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.framework.max_cycles, 5);
        assert_eq!(cfg.framework.validation_threshold, 0.6);
        assert_eq!(cfg.framework.cycle_interval, 3600);
        assert_eq!(cfg.trawler.min_accuracy, 0.95);
        assert_eq!(cfg.trawler.min_recall, 0.8);
    }
}
