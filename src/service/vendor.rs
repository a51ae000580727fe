use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::config::SeverityWeights;
use crate::models::{QueryStatus, SeverityBreakdown, VendorGrade, VendorScore, VendorScoreReport};
use crate::service::comparator::round_to;
use crate::store::{load_report_corpus, ReportArtifact};

/// 单个供应商的累计: 严重程度计数 + 出现过的报告下标
#[derive(Debug, Default)]
struct VendorTally {
    breakdown: SeverityBreakdown,
    reports: IndexSet<usize>,
}

/// 一次遍历所有报告构建 供应商 -> 统计 索引 (保持首次出现顺序)
fn index_vendors(artifacts: &[ReportArtifact], target: Option<&str>) -> IndexMap<String, VendorTally> {
    let target = target.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty());
    let mut index: IndexMap<String, VendorTally> = IndexMap::new();

    for (report_idx, artifact) in artifacts.iter().enumerate() {
        for row in &artifact.rows {
            if let Some(t) = &target {
                if row.vendor_name.to_lowercase() != *t {
                    continue;
                }
            }
            let tally = index.entry(row.vendor_name.clone()).or_default();
            tally.reports.insert(report_idx);
            if let Some(severity) = row.severity {
                tally.breakdown.record(severity);
            }
        }
    }

    index
}

fn score_vendor(name: String, tally: VendorTally, weights: &SeverityWeights) -> VendorScore {
    let b = tally.breakdown;
    let deduction = weights.critical * b.critical as f64
        + weights.high * b.high as f64
        + weights.medium * b.medium as f64
        + weights.low * b.low as f64;
    let score = round_to((100.0 + deduction).clamp(0.0, 100.0), 2);

    VendorScore {
        vendor_name: name,
        score,
        grade: VendorGrade::from_score(score),
        severity_breakdown: b,
        total_discrepancies: b.total(),
        report_count: tally.reports.len(),
    }
}

/// 基于历史报告计算供应商评分 (无匹配加分)，按得分降序
pub fn aggregate_vendor_scores(
    artifacts: &[ReportArtifact],
    target: Option<&str>,
    weights: &SeverityWeights,
) -> VendorScoreReport {
    let index = index_vendors(artifacts, target);

    let mut vendor_scores: Vec<VendorScore> = index
        .into_iter()
        .map(|(name, tally)| score_vendor(name, tally, weights))
        .collect();
    // 稳定排序: 同分保持首次出现顺序
    vendor_scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    let (status, message) = if vendor_scores.is_empty() {
        let message = match target {
            Some(vendor) => format!("No discrepancy data found for vendor '{vendor}'"),
            None => "No discrepancy reports available".to_string(),
        };
        (QueryStatus::NoData, Some(message))
    } else {
        (QueryStatus::Success, None)
    };

    VendorScoreReport {
        status,
        message,
        total_vendors: vendor_scores.len(),
        total_reports_analyzed: artifacts.len(),
        vendor_scores,
    }
}

/// 读取报告目录并评分；坏报告跳过，不影响其余报告
pub fn vendor_scores_from_dir(
    report_dir: impl AsRef<Path>,
    target: Option<&str>,
    weights: &SeverityWeights,
) -> VendorScoreReport {
    let corpus = load_report_corpus(report_dir);
    if !corpus.skipped.is_empty() {
        tracing::warn!("{} report(s) skipped during vendor aggregation", corpus.skipped.len());
    }

    let report = aggregate_vendor_scores(&corpus.artifacts, target, weights);
    tracing::info!(
        "Vendor scores: {} vendors over {} reports",
        report.total_vendors,
        report.total_reports_analyzed
    );
    report
}
