use crate::config::EngineConfig;
use crate::models::{MatchBuckets, Severity, SeverityBreakdown, TrustLevel, TrustScore};
use crate::service::comparator::round_to;

/// 单次对账信任分
///
/// `score = clamp(100 + Σ 扣分 + match_bonus × 高置信度匹配数, 0, 100)`，
/// 每条字段差异单独扣分，一条明细可以贡献多条差异。
pub fn calculate_trust_score(buckets: &MatchBuckets, config: &EngineConfig) -> TrustScore {
    let breakdown: SeverityBreakdown = buckets
        .potential_discrepancies
        .iter()
        .flat_map(|m| m.discrepancies())
        .map(|d| d.severity)
        .collect();

    let deduction: f64 = [Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
        .into_iter()
        .map(|s| config.severity_weights.weight(s) * breakdown.count(s) as f64)
        .sum();

    let total_items = buckets.fuzzy_matches.len();
    let successful_matches = buckets
        .fuzzy_matches
        .iter()
        .filter(|m| m.overall_score >= config.high_confidence_threshold)
        .count();

    let raw = 100.0 + deduction + config.match_bonus * successful_matches as f64;
    let score = round_to(raw.clamp(0.0, 100.0), 2);
    let level = TrustLevel::from_score(score);

    let match_rate = if total_items > 0 {
        round_to(successful_matches as f64 / total_items as f64 * 100.0, 2)
    } else {
        0.0
    };

    TrustScore {
        score,
        level,
        color: level.color().to_string(),
        severity_breakdown: breakdown,
        total_discrepancies: breakdown.total(),
        successful_matches,
        total_items,
        match_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldDiscrepancy, FuzzyMatch, MatchResult};

    fn discrepancy(severity: Severity) -> FieldDiscrepancy {
        FieldDiscrepancy {
            field: "net_cost".into(),
            extracted_value: None,
            mapping_value: None,
            difference: None,
            difference_percent: None,
            similarity: None,
            severity,
        }
    }

    fn fuzzy(score: f64, severities: &[Severity]) -> FuzzyMatch {
        FuzzyMatch {
            mapping_file: "a.json".into(),
            extracted_line: Some(1),
            mapping_line: Some(1),
            campaign: None,
            overall_score: score,
            match_details: MatchResult {
                overall_score: score,
                discrepancies: severities.iter().copied().map(discrepancy).collect(),
                ..Default::default()
            },
        }
    }

    fn buckets(matches: Vec<FuzzyMatch>) -> MatchBuckets {
        let potential_discrepancies = matches
            .iter()
            .filter(|m| !m.discrepancies().is_empty())
            .cloned()
            .collect();
        MatchBuckets {
            fuzzy_matches: matches,
            potential_discrepancies,
            no_match_found: vec![],
        }
    }

    #[test]
    fn empty_run_is_perfect_with_zero_rate() {
        let trust = calculate_trust_score(&MatchBuckets::default(), &EngineConfig::default());
        assert_eq!(trust.score, 100.0);
        assert_eq!(trust.level, TrustLevel::Excellent);
        assert_eq!(trust.color, "green");
        assert_eq!(trust.match_rate, 0.0);
        assert_eq!(trust.total_items, 0);
    }

    #[test]
    fn deductions_and_bonus() {
        let b = buckets(vec![
            fuzzy(0.95, &[Severity::Critical, Severity::Low]),
            fuzzy(0.8, &[Severity::High]),
            fuzzy(0.92, &[]),
        ]);
        let trust = calculate_trust_score(&b, &EngineConfig::default());
        // 100 - 15 - 1 - 8 + 2*2
        assert_eq!(trust.score, 80.0);
        assert_eq!(trust.level, TrustLevel::Good);
        assert_eq!(trust.severity_breakdown.critical, 1);
        assert_eq!(trust.severity_breakdown.high, 1);
        assert_eq!(trust.severity_breakdown.low, 1);
        assert_eq!(trust.total_discrepancies, 3);
        assert_eq!(trust.successful_matches, 2);
        assert_eq!(trust.total_items, 3);
        assert_eq!(trust.match_rate, 66.67);
    }

    #[test]
    fn score_exactly_at_high_confidence_earns_bonus() {
        let b = buckets(vec![fuzzy(0.9, &[Severity::Medium]), fuzzy(0.899, &[])]);
        let trust = calculate_trust_score(&b, &EngineConfig::default());
        // 100 - 4 + 2
        assert_eq!(trust.score, 98.0);
        assert_eq!(trust.successful_matches, 1);
        assert_eq!(trust.match_rate, 50.0);
    }

    #[test]
    fn score_is_clamped() {
        let many = vec![Severity::Critical; 20];
        let trust = calculate_trust_score(&buckets(vec![fuzzy(0.75, &many)]), &EngineConfig::default());
        assert_eq!(trust.score, 0.0);
        assert_eq!(trust.level, TrustLevel::Critical);

        let clean: Vec<FuzzyMatch> = (0..10).map(|_| fuzzy(1.0, &[])).collect();
        let trust = calculate_trust_score(&buckets(clean), &EngineConfig::default());
        assert_eq!(trust.score, 100.0);
        assert_eq!(trust.match_rate, 100.0);
    }

    #[test]
    fn more_critical_discrepancies_never_raise_the_score() {
        let config = EngineConfig::default();
        let mut previous = f64::MAX;
        for n in 0..10 {
            let severities = vec![Severity::Critical; n];
            let trust = calculate_trust_score(&buckets(vec![fuzzy(0.95, &severities)]), &config);
            assert!(trust.score <= previous);
            assert!((0.0..=100.0).contains(&trust.score));
            previous = trust.score;
        }
    }

    #[test]
    fn alternate_weights_are_injected() {
        let mut config = EngineConfig::default();
        config.severity_weights.medium = -10.0;
        config.match_bonus = 0.0;
        let trust = calculate_trust_score(&buckets(vec![fuzzy(0.95, &[Severity::Medium])]), &config);
        assert_eq!(trust.score, 90.0);
    }
}
