use serde::{Deserialize, Serialize};

use super::SeverityBreakdown;

/// 单次对账的信任等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl TrustLevel {
    /// >=90 EXCELLENT, >=75 GOOD, >=60 FAIR, >=40 POOR, 其余 CRITICAL
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 75.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else if score >= 40.0 {
            Self::Poor
        } else {
            Self::Critical
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Excellent => "green",
            Self::Good => "blue",
            Self::Fair => "yellow",
            Self::Poor => "orange",
            Self::Critical => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    pub score: f64,
    pub level: TrustLevel,
    pub color: String,
    pub severity_breakdown: SeverityBreakdown,
    pub total_discrepancies: u32,
    /// 得分 >= 0.9 的高置信度匹配数
    pub successful_matches: usize,
    pub total_items: usize,
    pub match_rate: f64,
}

/// 供应商等级，分档与信任等级一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorGrade {
    A,
    B,
    C,
    D,
    F,
}

impl VendorGrade {
    pub fn from_score(score: f64) -> Self {
        match TrustLevel::from_score(score) {
            TrustLevel::Excellent => Self::A,
            TrustLevel::Good => Self::B,
            TrustLevel::Fair => Self::C,
            TrustLevel::Poor => Self::D,
            TrustLevel::Critical => Self::F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorScore {
    pub vendor_name: String,
    pub score: f64,
    pub grade: VendorGrade,
    pub severity_breakdown: SeverityBreakdown,
    pub total_discrepancies: u32,
    /// 包含该供应商的历史报告数
    pub report_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    NoData,
}

/// 供应商评分查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorScoreReport {
    pub status: QueryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total_vendors: usize,
    pub total_reports_analyzed: usize,
    pub vendor_scores: Vec<VendorScore>,
}
