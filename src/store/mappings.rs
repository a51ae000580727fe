use std::path::Path;

use rayon::prelude::*;
use serde_json::Value;

use super::{file_label, list_files};
use crate::error::{ReconError, Result};
use crate::models::{MappingCorpus, MappingRecord, SkippedSource};
use crate::service::normalizer::normalize_mapping;

/// 读取并归一化单个映射文件
pub fn load_mapping_source(path: &Path) -> Result<MappingRecord> {
    let source_file = file_label(path);
    let content = std::fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
    let raw: Value = serde_json::from_str(&content).map_err(|e| ReconError::MalformedMapping {
        source_file: source_file.clone(),
        reason: e.to_string(),
    })?;
    Ok(normalize_mapping(&raw, &source_file))
}

/// 加载目录下全部 *.json 映射文件 (按文件名排序)；坏文件跳过并记录，不中断整批
pub fn load_mapping_corpus(dir: impl AsRef<Path>) -> MappingCorpus {
    let dir = dir.as_ref();
    if !dir.exists() {
        tracing::warn!("Mapping folder not found: {}", dir.display());
        return MappingCorpus::default();
    }

    let files = match list_files(dir, "json") {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("Cannot list mapping folder: {}", e);
            return MappingCorpus::default();
        }
    };
    if files.is_empty() {
        tracing::warn!("No JSON files found in {}", dir.display());
        return MappingCorpus::default();
    }

    let loaded: Vec<(String, Result<MappingRecord>)> = files
        .par_iter()
        .map(|path| (file_label(path), load_mapping_source(path)))
        .collect();

    let mut corpus = MappingCorpus::default();
    for (source_file, result) in loaded {
        match result {
            Ok(record) => {
                tracing::info!(
                    "Loaded mapping {} ({} line items)",
                    source_file,
                    record.line_items.len()
                );
                corpus.records.push(record);
            }
            Err(e) => {
                tracing::error!("Skipping mapping {}: {}", source_file, e);
                corpus.skipped.push(SkippedSource {
                    source_file,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Total mapping files loaded: {}, skipped: {}",
        corpus.records.len(),
        corpus.skipped.len()
    );
    corpus
}
