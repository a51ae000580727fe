use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::models::{FuzzyMatch, LineItem, MappingRecord, MatchOutcome, MatchResult, UnmatchedItem};
use crate::service::matcher::LineItemMatcher;

pub const WEAK_MATCH_REASON: &str = "No strong match found in mapping files";
pub const NO_CANDIDATES_REASON: &str = "No mapping line items available";

/// 候选映射明细及其比较结果
#[derive(Debug, Clone)]
pub struct Candidate<'m> {
    pub source_file: &'m str,
    pub item: &'m LineItem,
    pub result: MatchResult,
}

/// 映射源按文件名升序 (稳定排序，同名保持输入顺序)，源内按明细顺序
pub fn search_order(mappings: &[MappingRecord]) -> Vec<&MappingRecord> {
    let mut ordered: Vec<&MappingRecord> = mappings.iter().collect();
    ordered.sort_by(|a, b| a.source_file.cmp(&b.source_file));
    ordered
}

/// 全量遍历候选，只有严格更高的分数才替换当前最佳 (同分保留先遇到的)
pub fn find_best_match<'m>(
    extracted: &LineItem,
    mappings: &[&'m MappingRecord],
    matcher: &LineItemMatcher<'_>,
) -> Option<Candidate<'m>> {
    mappings
        .iter()
        .copied()
        .flat_map(|record: &'m MappingRecord| {
            record
                .line_items
                .iter()
                .map(move |item| (record.source_file.as_str(), item))
        })
        .fold(None, |best: Option<Candidate<'m>>, (source_file, item)| {
            let result = matcher.compare(extracted, item);
            match best {
                Some(current) if current.result.overall_score >= result.overall_score => Some(current),
                _ => Some(Candidate {
                    source_file,
                    item,
                    result,
                }),
            }
        })
}

fn unmatched(extracted: &LineItem, best_score: f64, reason: &str) -> UnmatchedItem {
    UnmatchedItem {
        extracted_line: extracted.line_id,
        campaign: extracted.campaign_name.clone(),
        io: extracted.insertion_order_id.clone(),
        best_score,
        reason: reason.to_string(),
    }
}

/// 对单条提取明细分类；无候选且未开启 report_missing_candidates 时返回 None
pub fn classify(
    extracted: &LineItem,
    mappings: &[&MappingRecord],
    matcher: &LineItemMatcher<'_>,
    config: &EngineConfig,
) -> Option<MatchOutcome> {
    let Some(best) = find_best_match(extracted, mappings, matcher) else {
        if config.report_missing_candidates {
            return Some(MatchOutcome::Unmatched(unmatched(extracted, 0.0, NO_CANDIDATES_REASON)));
        }
        tracing::debug!("line {:?} has no mapping candidates, dropped", extracted.line_id);
        return None;
    };

    let score = best.result.overall_score;
    if score < config.match_threshold {
        return Some(MatchOutcome::Unmatched(unmatched(extracted, score, WEAK_MATCH_REASON)));
    }

    let has_discrepancies = !best.result.discrepancies.is_empty();
    let matched = FuzzyMatch {
        mapping_file: best.source_file.to_string(),
        extracted_line: extracted.line_id,
        mapping_line: best.item.line_id,
        campaign: extracted.campaign_name.clone(),
        overall_score: score,
        match_details: best.result,
    };

    Some(if has_discrepancies {
        MatchOutcome::Discrepant(matched)
    } else {
        MatchOutcome::Clean(matched)
    })
}

/// 每条提取明细独立搜索 (并行)，结果保持提取顺序
pub fn select_matches(
    extracted: &[LineItem],
    mappings: &[MappingRecord],
    config: &EngineConfig,
) -> Vec<MatchOutcome> {
    let ordered = search_order(mappings);
    let matcher = LineItemMatcher::new(config);

    extracted
        .par_iter()
        .map(|item| classify(item, &ordered, &matcher, config))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(line_id: u32, campaign: &str, billed: Option<f64>) -> LineItem {
        LineItem {
            line_id: Some(line_id),
            campaign_name: Some(campaign.into()),
            billed_impressions: billed,
            ..Default::default()
        }
    }

    fn record(source: &str, items: Vec<LineItem>) -> MappingRecord {
        MappingRecord {
            source_file: source.into(),
            line_items: items,
            ..Default::default()
        }
    }

    #[test]
    fn picks_highest_score_across_sources() {
        let config = EngineConfig::default();
        let extracted = vec![item(1, "Summer Sale", Some(1_000_000.0))];
        let mappings = vec![
            record("a.json", vec![item(1, "Winter Promo", Some(1_000_000.0))]),
            record("b.json", vec![item(1, "Summer Sale", Some(1_000_000.0))]),
        ];

        let outcomes = select_matches(&extracted, &mappings, &config);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            MatchOutcome::Clean(m) => {
                assert_eq!(m.mapping_file, "b.json");
                assert_eq!(m.overall_score, 1.0);
            }
            other => panic!("expected clean match, got {other:?}"),
        }
    }

    #[test]
    fn ties_keep_first_source_by_name() {
        let config = EngineConfig::default();
        let extracted = vec![item(1, "Summer Sale", None)];
        // 输入顺序与文件名顺序相反
        let mappings = vec![
            record("z.json", vec![item(1, "Summer Sale", None)]),
            record("m.json", vec![item(4, "Summer Sale", None), item(5, "Summer Sale", None)]),
        ];

        let outcomes = select_matches(&extracted, &mappings, &config);
        let MatchOutcome::Clean(m) = &outcomes[0] else {
            panic!("expected clean match");
        };
        assert_eq!(m.mapping_file, "m.json");
        assert_eq!(m.mapping_line, Some(4));
    }

    #[test]
    fn discrepancy_is_flagged_on_matched_line() {
        let config = EngineConfig::default();
        let extracted = vec![item(1, "Summer Sale", Some(1_000_000.0))];
        let mappings = vec![record("a.json", vec![item(1, "Summer Sale", Some(800_000.0))])];

        let outcomes = select_matches(&extracted, &mappings, &config);
        let MatchOutcome::Discrepant(m) = &outcomes[0] else {
            panic!("expected discrepant match");
        };
        assert_eq!(m.discrepancies().len(), 1);
        assert_eq!(m.discrepancies()[0].difference_percent, Some(20.0));
    }

    #[test]
    fn weak_and_zero_scores_are_unmatched() {
        let config = EngineConfig::default();
        let extracted = vec![item(7, "Brand Lift", None)];
        let mappings = vec![record("a.json", vec![item(1, "Zzz", None)])];

        let outcomes = select_matches(&extracted, &mappings, &config);
        let MatchOutcome::Unmatched(u) = &outcomes[0] else {
            panic!("expected unmatched");
        };
        assert_eq!(u.extracted_line, Some(7));
        assert_eq!(u.best_score, 0.0);
        assert_eq!(u.reason, WEAK_MATCH_REASON);
    }

    #[test]
    fn score_exactly_at_match_threshold_is_a_match() {
        // "abcdefghij" / "abcdefgxyz": 2*7/20 = 0.7，仅活动名称参与计分
        let config = EngineConfig::default().with_overrides(Some(0.7), None);
        let extracted = vec![item(1, "abcdefghij", None)];
        let mappings = vec![record("a.json", vec![item(1, "abcdefgxyz", None)])];

        let outcomes = select_matches(&extracted, &mappings, &config);
        let MatchOutcome::Clean(m) = &outcomes[0] else {
            panic!("expected clean match, got {:?}", outcomes[0]);
        };
        assert_eq!(m.overall_score, 0.7);
    }

    #[test]
    fn empty_corpus_reports_unmatched_by_default() {
        let config = EngineConfig::default();
        let extracted = vec![item(1, "Summer Sale", None)];

        let outcomes = select_matches(&extracted, &[], &config);
        let MatchOutcome::Unmatched(u) = &outcomes[0] else {
            panic!("expected unmatched");
        };
        assert_eq!(u.reason, NO_CANDIDATES_REASON);

        let outcomes = select_matches(&extracted, &[record("empty.json", vec![])], &config);
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn empty_corpus_drops_item_in_legacy_mode() {
        let config = EngineConfig {
            report_missing_candidates: false,
            ..Default::default()
        };
        let extracted = vec![item(1, "Summer Sale", None)];
        assert!(select_matches(&extracted, &[], &config).is_empty());
    }

    #[test]
    fn output_order_follows_extracted_order() {
        let config = EngineConfig::default();
        let extracted: Vec<LineItem> = (1..=50).map(|i| item(i, &format!("Campaign {i}"), None)).collect();
        let mappings = vec![record("a.json", extracted.clone())];

        let outcomes = select_matches(&extracted, &mappings, &config);
        let lines: Vec<Option<u32>> = outcomes
            .iter()
            .map(|o| match o {
                MatchOutcome::Clean(m) | MatchOutcome::Discrepant(m) => m.extracted_line,
                MatchOutcome::Unmatched(u) => u.extracted_line,
            })
            .collect();
        assert_eq!(lines, (1..=50).map(Some).collect::<Vec<_>>());
    }
}
