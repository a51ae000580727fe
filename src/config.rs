use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};
use crate::models::Severity;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 映射文件目录与报告目录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mapping_dir: String,
    pub report_dir: String,
    pub save_report: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mapping_dir: "mapping".to_string(),
            report_dir: "output".to_string(),
            save_report: true,
        }
    }
}

/// 匹配引擎参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 文本字段相似度阈值 (0-1)
    pub string_threshold: f64,
    /// 数值字段容差 (百分比)
    pub number_tolerance: f64,
    /// 文本字段部分相似的下限，(floor, threshold) 之间记为 LOW 提示
    pub partial_text_floor: f64,
    /// 模糊匹配的最低总分
    pub match_threshold: f64,
    /// 高置信度匹配的最低总分
    pub high_confidence_threshold: f64,
    /// 没有任何候选时是否仍然记入 no_match_found
    pub report_missing_candidates: bool,
    pub weights: FieldWeights,
    pub severity_weights: SeverityWeights,
    /// 每个高置信度匹配的加分
    pub match_bonus: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            string_threshold: 0.8,
            number_tolerance: 5.0,
            partial_text_floor: 0.5,
            match_threshold: 0.7,
            high_confidence_threshold: 0.9,
            report_missing_candidates: true,
            weights: FieldWeights::default(),
            severity_weights: SeverityWeights::default(),
            match_bonus: 2.0,
        }
    }
}

impl EngineConfig {
    /// 以调用方参数覆盖阈值
    pub fn with_overrides(mut self, string_threshold: Option<f64>, number_tolerance: Option<f64>) -> Self {
        if let Some(t) = string_threshold {
            self.string_threshold = t;
        }
        if let Some(t) = number_tolerance {
            self.number_tolerance = t;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ReconError::InvalidConfig(format!("{name} must be within [0, 1], got {v}")))
            }
        };
        unit("string_threshold", self.string_threshold)?;
        unit("partial_text_floor", self.partial_text_floor)?;
        unit("match_threshold", self.match_threshold)?;
        unit("high_confidence_threshold", self.high_confidence_threshold)?;

        if !self.number_tolerance.is_finite() || self.number_tolerance < 0.0 {
            return Err(ReconError::InvalidConfig(format!(
                "number_tolerance must be a non-negative percent, got {}",
                self.number_tolerance
            )));
        }
        Ok(())
    }
}

/// 字段权重表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub campaign_name: f64,
    pub insertion_order_id: f64,
    pub booked_impressions: f64,
    pub billed_impressions: f64,
    pub clicks: f64,
    pub net_cost: f64,
    pub gross_revenue: f64,
    pub net_revenue: f64,
    pub ad_unit: f64,
    pub format: f64,
    pub geo: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            campaign_name: 3.0,
            insertion_order_id: 3.0,
            booked_impressions: 2.0,
            billed_impressions: 2.5,
            clicks: 1.5,
            net_cost: 2.5,
            gross_revenue: 2.0,
            net_revenue: 2.0,
            ad_unit: 1.0,
            format: 1.0,
            geo: 1.0,
        }
    }
}

/// 每条差异的扣分 (负数)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: -15.0,
            high: -8.0,
            medium: -4.0,
            low: -1.0,
        }
    }
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> recon.toml (可选) -> RECON_ 前缀环境变量
    ///
    /// 嵌套键用 `__` 分隔，例如 `RECON_ENGINE__STRING_THRESHOLD=0.85`。
    /// 配置文件路径可由 `RECON_CONFIG_FILE` 指定。
    pub fn from_env() -> Result<Self> {
        let file = std::env::var("RECON_CONFIG_FILE").unwrap_or_else(|_| "recon".to_string());

        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("RECON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }
}
