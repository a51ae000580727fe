pub mod comparator;
pub mod matcher;
pub mod normalizer;
pub mod reconciliation;
pub mod report;
pub mod selector;
pub mod trust;
pub mod vendor;

pub use comparator::{number_tolerance, string_similarity, NumberComparison};
pub use matcher::{compare_line_items, LineItemMatcher};
pub use normalizer::normalize_mapping;
pub use reconciliation::{run_reconciliation, ReconciliationService, RunOptions};
pub use report::build_discrepancy_report;
pub use selector::select_matches;
pub use trust::calculate_trust_score;
pub use vendor::{aggregate_vendor_scores, vendor_scores_from_dir};
