use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{InvoiceHeader, LineItem};

/// 归一化后的映射记录 (一个映射文件对应一条)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_index: Option<Value>,
    pub invoice_header: InvoiceHeader,
    pub line_items: Vec<LineItem>,
}

/// 加载失败被跳过的映射源
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSource {
    pub source_file: String,
    pub reason: String,
}

/// 映射语料: 成功加载的记录 + 被跳过的源
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingCorpus {
    pub records: Vec<MappingRecord>,
    pub skipped: Vec<SkippedSource>,
}

impl MappingCorpus {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn line_item_count(&self) -> usize {
        self.records.iter().map(|r| r.line_items.len()).sum()
    }
}
