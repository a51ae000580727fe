use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Severity, TrustScore};

/// 差异字段的取值 (数值或文本)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// 字段级差异
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiscrepancy {
    pub field: String,
    pub extracted_value: Option<FieldValue>,
    pub mapping_value: Option<FieldValue>,
    /// 数值字段: 绝对差
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    /// 数值字段: 差异百分比 (保留两位小数)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference_percent: Option<f64>,
    /// 文本字段: 相似度 (保留两位小数)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: String,
    pub score: f64,
}

/// 单对明细的比较结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub overall_score: f64,
    pub matched_fields: Vec<String>,
    pub discrepancies: Vec<FieldDiscrepancy>,
    pub field_scores: Vec<FieldScore>,
}

/// 提取明细与最佳映射明细的配对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    pub mapping_file: String,
    pub extracted_line: Option<u32>,
    pub mapping_line: Option<u32>,
    pub campaign: Option<String>,
    pub overall_score: f64,
    pub match_details: MatchResult,
}

impl FuzzyMatch {
    pub fn discrepancies(&self) -> &[FieldDiscrepancy] {
        &self.match_details.discrepancies
    }
}

/// 未找到足够相似映射的提取明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedItem {
    pub extracted_line: Option<u32>,
    pub campaign: Option<String>,
    pub io: Option<String>,
    pub best_score: f64,
    pub reason: String,
}

/// 每条提取明细恰好归入一个结果
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Clean(FuzzyMatch),
    Discrepant(FuzzyMatch),
    Unmatched(UnmatchedItem),
}

/// 三个结果桶: fuzzy_matches 包含全部配对, potential_discrepancies 为其中有差异的子集
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchBuckets {
    pub fuzzy_matches: Vec<FuzzyMatch>,
    pub potential_discrepancies: Vec<FuzzyMatch>,
    pub no_match_found: Vec<UnmatchedItem>,
}

impl MatchBuckets {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = MatchOutcome>) -> Self {
        let mut buckets = Self::default();
        for outcome in outcomes {
            match outcome {
                MatchOutcome::Clean(m) => buckets.fuzzy_matches.push(m),
                MatchOutcome::Discrepant(m) => {
                    buckets.potential_discrepancies.push(m.clone());
                    buckets.fuzzy_matches.push(m);
                }
                MatchOutcome::Unmatched(u) => buckets.no_match_found.push(u),
            }
        }
        buckets
    }
}

/// 报告 CSV 的一行 (列名即持久化契约)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyRow {
    #[serde(rename = "Vendor Name")]
    pub vendor_name: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Mapping File")]
    pub mapping_file: String,
    #[serde(rename = "Campaign")]
    pub campaign: Option<String>,
    #[serde(rename = "Line ID")]
    pub line_id: Option<u32>,
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Extracted Value")]
    pub extracted_value: Option<FieldValue>,
    #[serde(rename = "Expected Value")]
    pub expected_value: Option<FieldValue>,
    #[serde(rename = "Difference")]
    pub difference: Option<f64>,
    #[serde(rename = "Difference %")]
    pub difference_percent: Option<f64>,
    #[serde(rename = "Severity")]
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_line_items: usize,
    pub fuzzy_matches: usize,
    pub discrepancies: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

/// 一次对账的完整输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
    pub mapping_files_count: usize,
    #[serde(flatten)]
    pub buckets: MatchBuckets,
    pub discrepancy_report: Vec<DiscrepancyRow>,
    pub report_path: Option<String>,
    pub trust_score: TrustScore,
    pub summary: ReconciliationSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzy(line: u32, with_discrepancy: bool) -> FuzzyMatch {
        let mut details = MatchResult {
            overall_score: 0.95,
            ..Default::default()
        };
        if with_discrepancy {
            details.discrepancies.push(FieldDiscrepancy {
                field: "clicks".into(),
                extracted_value: Some(FieldValue::Number(120.0)),
                mapping_value: Some(FieldValue::Number(100.0)),
                difference: Some(20.0),
                difference_percent: Some(16.67),
                similarity: None,
                severity: Severity::Critical,
            });
        }
        FuzzyMatch {
            mapping_file: "a.json".into(),
            extracted_line: Some(line),
            mapping_line: Some(1),
            campaign: None,
            overall_score: 0.95,
            match_details: details,
        }
    }

    #[test]
    fn discrepant_outcome_lands_in_both_match_buckets() {
        let buckets = MatchBuckets::from_outcomes(vec![
            MatchOutcome::Clean(fuzzy(1, false)),
            MatchOutcome::Discrepant(fuzzy(2, true)),
            MatchOutcome::Unmatched(UnmatchedItem {
                extracted_line: Some(3),
                campaign: None,
                io: None,
                best_score: 0.2,
                reason: "No strong match found in mapping files".into(),
            }),
        ]);
        assert_eq!(buckets.fuzzy_matches.len(), 2);
        assert_eq!(buckets.potential_discrepancies.len(), 1);
        assert_eq!(buckets.potential_discrepancies[0].extracted_line, Some(2));
        assert_eq!(buckets.no_match_found.len(), 1);
    }

    #[test]
    fn field_value_is_untagged_on_the_wire() {
        let json = serde_json::to_string(&FieldValue::Number(1.5)).unwrap();
        assert_eq!(json, "1.5");
        let json = serde_json::to_string(&FieldValue::Text("Banner".into())).unwrap();
        assert_eq!(json, "\"Banner\"");
    }
}
