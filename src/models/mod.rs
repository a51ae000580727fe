pub mod invoice;
pub mod line_item;
pub mod mapping;
pub mod result;
pub mod score;
pub mod severity;

pub use invoice::{validate_extracted, ExtractedInvoice, ExtractionValidation, InvoiceHeader};
pub use line_item::LineItem;
pub use mapping::{MappingCorpus, MappingRecord, SkippedSource};
pub use result::{
    DiscrepancyRow, FieldDiscrepancy, FieldScore, FieldValue, FuzzyMatch, MatchBuckets,
    MatchOutcome, MatchResult, ReconciliationResult, ReconciliationSummary, RunStatus,
    UnmatchedItem,
};
pub use score::{QueryStatus, TrustLevel, TrustScore, VendorGrade, VendorScore, VendorScoreReport};
pub use severity::{Severity, SeverityBreakdown};
