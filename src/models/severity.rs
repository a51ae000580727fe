use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 差异严重程度，CRITICAL 最严重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// 按差异百分比分档: <1 LOW, [1,5) MEDIUM, [5,10) HIGH, >=10 CRITICAL
    pub fn from_difference_percent(percent: f64) -> Self {
        if percent < 1.0 {
            Self::Low
        } else if percent < 5.0 {
            Self::Medium
        } else if percent < 10.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// 报告排序用: CRITICAL 排第一
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// 各严重程度的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    #[serde(rename = "CRITICAL")]
    pub critical: u32,
    #[serde(rename = "HIGH")]
    pub high: u32,
    #[serde(rename = "MEDIUM")]
    pub medium: u32,
    #[serde(rename = "LOW")]
    pub low: u32,
}

impl SeverityBreakdown {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn count(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }
}

impl FromIterator<Severity> for SeverityBreakdown {
    fn from_iter<I: IntoIterator<Item = Severity>>(iter: I) -> Self {
        let mut breakdown = Self::default();
        for severity in iter {
            breakdown.record(severity);
        }
        breakdown
    }
}
