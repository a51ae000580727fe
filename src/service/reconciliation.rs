use serde::Deserialize;
use serde_json::Value;

use crate::config::{AppConfig, EngineConfig};
use crate::models::{
    validate_extracted, ExtractedInvoice, MappingCorpus, MatchBuckets, ReconciliationResult,
    ReconciliationSummary, RunStatus, VendorScoreReport,
};
use crate::service::normalizer::normalize_extracted;
use crate::service::report::build_discrepancy_report;
use crate::service::selector::select_matches;
use crate::service::trust::calculate_trust_score;
use crate::service::vendor::vendor_scores_from_dir;
use crate::store::{load_mapping_corpus, save_discrepancy_report};

pub const EMPTY_CORPUS_WARNING: &str = "No mapping files available";

/// 单次调用可覆盖的参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOptions {
    pub string_threshold: Option<f64>,
    pub number_tolerance: Option<f64>,
    pub save_report: Option<bool>,
}

/// 对账核心: 输入为提取发票与已加载的映射语料，纯函数，不落盘
pub fn run_reconciliation(
    invoice: &ExtractedInvoice,
    corpus: &MappingCorpus,
    engine: &EngineConfig,
) -> ReconciliationResult {
    let warning = corpus.is_empty().then(|| EMPTY_CORPUS_WARNING.to_string());

    let outcomes = select_matches(&invoice.line_items, &corpus.records, engine);
    let buckets = MatchBuckets::from_outcomes(outcomes);

    let trust_score = calculate_trust_score(&buckets, engine);
    let discrepancy_report = build_discrepancy_report(&buckets, invoice.vendor_label());

    let summary = ReconciliationSummary {
        total_line_items: invoice.line_items.len(),
        fuzzy_matches: buckets.fuzzy_matches.len(),
        discrepancies: buckets.potential_discrepancies.len(),
        unmatched: buckets.no_match_found.len(),
    };

    ReconciliationResult {
        status: RunStatus::Success,
        warning,
        errors: Vec::new(),
        mapping_files_count: corpus.records.len(),
        buckets,
        discrepancy_report,
        report_path: None,
        trust_score,
        summary,
    }
}

/// 前置校验失败时的结果
pub fn failed_result(errors: Vec<String>, engine: &EngineConfig) -> ReconciliationResult {
    let buckets = MatchBuckets::default();
    ReconciliationResult {
        status: RunStatus::Failed,
        warning: None,
        errors,
        mapping_files_count: 0,
        trust_score: calculate_trust_score(&buckets, engine),
        buckets,
        discrepancy_report: Vec::new(),
        report_path: None,
        summary: ReconciliationSummary::default(),
    }
}

/// 对账服务: 加载映射目录、执行匹配、保存报告
pub struct ReconciliationService {
    config: AppConfig,
}

impl ReconciliationService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 从原始 JSON 开始: 校验 -> 归一化 -> 对账
    pub fn reconcile_value(&self, raw: &Value, options: &RunOptions) -> ReconciliationResult {
        let engine = self.engine_for(options);

        let validation = validate_extracted(raw);
        for w in &validation.warnings {
            tracing::warn!("Extracted invoice: {}", w);
        }
        if !validation.valid {
            tracing::warn!("Extracted invoice rejected: {:?}", validation.errors);
            return failed_result(validation.errors, &engine);
        }

        let invoice = normalize_extracted(raw);
        self.reconcile(&invoice, options)
    }

    pub fn reconcile(&self, invoice: &ExtractedInvoice, options: &RunOptions) -> ReconciliationResult {
        let engine = self.engine_for(options);
        if let Err(e) = engine.validate() {
            tracing::warn!("Rejected run options: {}", e);
            return failed_result(vec![e.to_string()], &engine);
        }

        tracing::info!(
            "Reconciling invoice {:?} from {} ({} line items)",
            invoice.invoice_header.invoice_number,
            invoice.vendor_label(),
            invoice.line_items.len()
        );

        // 1. 加载映射语料
        let corpus = load_mapping_corpus(&self.config.storage.mapping_dir);
        if corpus.is_empty() {
            tracing::warn!("{}", EMPTY_CORPUS_WARNING);
        }

        // 2. 匹配 + 评分
        let mut result = run_reconciliation(invoice, &corpus, &engine);

        // 3. 保存报告 (仅当有差异行)
        let save = options.save_report.unwrap_or(self.config.storage.save_report);
        if save && !result.discrepancy_report.is_empty() {
            match save_discrepancy_report(&result.discrepancy_report, &self.config.storage.report_dir) {
                Ok(path) => result.report_path = Some(path.display().to_string()),
                Err(e) => tracing::error!("Failed to save discrepancy report: {}", e),
            }
        }

        tracing::info!(
            "Reconciliation done: matches {}, discrepancies {}, unmatched {}, trust {} ({:?})",
            result.summary.fuzzy_matches,
            result.summary.discrepancies,
            result.summary.unmatched,
            result.trust_score.score,
            result.trust_score.level
        );
        result
    }

    pub fn vendor_scores(&self, target: Option<&str>) -> VendorScoreReport {
        vendor_scores_from_dir(
            &self.config.storage.report_dir,
            target,
            &self.config.engine.severity_weights,
        )
    }

    fn engine_for(&self, options: &RunOptions) -> EngineConfig {
        self.config
            .engine
            .clone()
            .with_overrides(options.string_threshold, options.number_tolerance)
    }
}
