use crate::models::{DiscrepancyRow, MatchBuckets};

pub const REPORT_SOURCE: &str = "Fuzzy Match";

/// 将所有字段差异展开为报告行，按严重程度稳定排序 (CRITICAL 在前)
pub fn build_discrepancy_report(buckets: &MatchBuckets, vendor_name: &str) -> Vec<DiscrepancyRow> {
    let mut rows: Vec<DiscrepancyRow> = buckets
        .potential_discrepancies
        .iter()
        .flat_map(|m| {
            m.discrepancies().iter().map(move |d| DiscrepancyRow {
                vendor_name: vendor_name.to_string(),
                source: REPORT_SOURCE.to_string(),
                mapping_file: m.mapping_file.clone(),
                campaign: m.campaign.clone(),
                line_id: m.extracted_line,
                field: d.field.clone(),
                extracted_value: d.extracted_value.clone(),
                expected_value: d.mapping_value.clone(),
                difference: d.difference,
                difference_percent: d.difference_percent,
                severity: d.severity,
            })
        })
        .collect();

    // sort_by_key 为稳定排序
    rows.sort_by_key(|r| r.severity.rank());
    rows
}
