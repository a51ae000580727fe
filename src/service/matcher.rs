use crate::config::{EngineConfig, FieldWeights};
use crate::models::{FieldDiscrepancy, FieldScore, FieldValue, LineItem, MatchResult, Severity};
use crate::service::comparator::{number_tolerance, round_to, string_similarity};

/// 投放单号相似度阈值，固定值，不随 string_threshold 变化
pub const IO_THRESHOLD: f64 = 0.9;

/// 参与容差比较的数值字段 (顺序即评估顺序)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    BookedImpressions,
    BilledImpressions,
    Clicks,
    NetCost,
    GrossRevenue,
    NetRevenue,
}

impl NumericField {
    pub const ALL: [Self; 6] = [
        Self::BookedImpressions,
        Self::BilledImpressions,
        Self::Clicks,
        Self::NetCost,
        Self::GrossRevenue,
        Self::NetRevenue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BookedImpressions => "booked_impressions",
            Self::BilledImpressions => "billed_impressions",
            Self::Clicks => "clicks",
            Self::NetCost => "net_cost",
            Self::GrossRevenue => "gross_revenue",
            Self::NetRevenue => "net_revenue",
        }
    }

    pub fn value(self, item: &LineItem) -> Option<f64> {
        match self {
            Self::BookedImpressions => item.booked_impressions,
            Self::BilledImpressions => item.billed_impressions,
            Self::Clicks => item.clicks,
            Self::NetCost => item.net_cost,
            Self::GrossRevenue => item.gross_revenue,
            Self::NetRevenue => item.net_revenue,
        }
    }

    fn weight(self, weights: &FieldWeights) -> f64 {
        match self {
            Self::BookedImpressions => weights.booked_impressions,
            Self::BilledImpressions => weights.billed_impressions,
            Self::Clicks => weights.clicks,
            Self::NetCost => weights.net_cost,
            Self::GrossRevenue => weights.gross_revenue,
            Self::NetRevenue => weights.net_revenue,
        }
    }
}

/// 低权重文本字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    AdUnit,
    Format,
    Geo,
}

impl TextField {
    pub const ALL: [Self; 3] = [Self::AdUnit, Self::Format, Self::Geo];

    pub fn name(self) -> &'static str {
        match self {
            Self::AdUnit => "ad_unit",
            Self::Format => "format",
            Self::Geo => "geo",
        }
    }

    pub fn value(self, item: &LineItem) -> Option<&str> {
        match self {
            Self::AdUnit => item.ad_unit.as_deref(),
            Self::Format => item.format.as_deref(),
            Self::Geo => item.geo.as_deref(),
        }
    }

    fn weight(self, weights: &FieldWeights) -> f64 {
        match self {
            Self::AdUnit => weights.ad_unit,
            Self::Format => weights.format,
            Self::Geo => weights.geo,
        }
    }
}

/// 加权得分累加器
#[derive(Default)]
struct Scorecard {
    matched_fields: Vec<String>,
    discrepancies: Vec<FieldDiscrepancy>,
    scores: Vec<(&'static str, f64, f64)>,
}

impl Scorecard {
    fn matched(&mut self, field: &'static str, score: f64, weight: f64) {
        self.matched_fields.push(field.to_string());
        self.scores.push((field, score, weight));
    }

    fn finish(self) -> MatchResult {
        let total_weight: f64 = self.scores.iter().map(|(_, _, w)| w).sum();
        let overall = if total_weight > 0.0 {
            let weighted: f64 = self.scores.iter().map(|(_, s, w)| s * w).sum();
            (weighted / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        MatchResult {
            overall_score: round_to(overall, 3),
            matched_fields: self.matched_fields,
            discrepancies: self.discrepancies,
            field_scores: self
                .scores
                .into_iter()
                .map(|(field, score, _)| FieldScore {
                    field: field.to_string(),
                    score: round_to(score, 2),
                })
                .collect(),
        }
    }
}

/// 单对明细的加权多字段比较
pub struct LineItemMatcher<'a> {
    config: &'a EngineConfig,
}

impl<'a> LineItemMatcher<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn compare(&self, extracted: &LineItem, mapping: &LineItem) -> MatchResult {
        let cfg = self.config;
        let weights = &cfg.weights;
        let mut card = Scorecard::default();

        // 1. 标识字段: 活动名称 (可配置阈值) 与投放单号 (固定阈值)
        let campaign = string_similarity(
            extracted.campaign_name.as_deref(),
            mapping.campaign_name.as_deref(),
        );
        if campaign >= cfg.string_threshold {
            card.matched("campaign_name", campaign, weights.campaign_name);
        }

        let io = string_similarity(
            extracted.insertion_order_id.as_deref(),
            mapping.insertion_order_id.as_deref(),
        );
        if io >= IO_THRESHOLD {
            card.matched("insertion_order_id", io, weights.insertion_order_id);
        }

        // 2. 数值字段: 两侧都有值才比较
        for field in NumericField::ALL {
            let (ext, map) = (field.value(extracted), field.value(mapping));
            let Some(cmp) = number_tolerance(ext, map, cfg.number_tolerance) else {
                continue;
            };

            if cmp.within_tolerance {
                let score = (1.0 - cmp.difference_percent / 100.0).max(0.0);
                card.matched(field.name(), score, field.weight(weights));
            } else {
                card.discrepancies.push(FieldDiscrepancy {
                    field: field.name().to_string(),
                    extracted_value: ext.map(FieldValue::Number),
                    mapping_value: map.map(FieldValue::Number),
                    difference: Some(cmp.difference),
                    difference_percent: Some(cmp.difference_percent),
                    similarity: None,
                    severity: cmp.severity(),
                });
            }
        }

        // 3. 文本字段: 部分相似只做提示，不计分
        for field in TextField::ALL {
            let (ext, map) = (field.value(extracted), field.value(mapping));
            let similarity = string_similarity(ext, map);

            if similarity >= cfg.string_threshold {
                card.matched(field.name(), similarity, field.weight(weights));
            } else if similarity > cfg.partial_text_floor {
                card.discrepancies.push(FieldDiscrepancy {
                    field: field.name().to_string(),
                    extracted_value: ext.map(|s| FieldValue::Text(s.to_string())),
                    mapping_value: map.map(|s| FieldValue::Text(s.to_string())),
                    difference: None,
                    difference_percent: None,
                    similarity: Some(round_to(similarity, 2)),
                    severity: Severity::Low,
                });
            }
        }

        card.finish()
    }
}

/// 以给定配置比较一对明细
pub fn compare_line_items(extracted: &LineItem, mapping: &LineItem, config: &EngineConfig) -> MatchResult {
    LineItemMatcher::new(config).compare(extracted, mapping)
}
