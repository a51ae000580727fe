use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use rayon::prelude::*;

use super::{file_label, list_files};
use crate::error::{ReconError, Result};
use crate::models::{DiscrepancyRow, Severity, SkippedSource};

/// 报告 CSV 列 (历史报告回读依赖此列集合)
pub const REPORT_COLUMNS: [&str; 11] = [
    "Vendor Name",
    "Source",
    "Mapping File",
    "Campaign",
    "Line ID",
    "Field",
    "Extracted Value",
    "Expected Value",
    "Difference",
    "Difference %",
    "Severity",
];

pub const VENDOR_COLUMN: &str = "Vendor Name";
pub const SEVERITY_COLUMN: &str = "Severity";

/// 写出报告 (总是包含表头)
pub fn write_discrepancy_report<W: Write>(rows: &[DiscrepancyRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(REPORT_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| ReconError::io("<report writer>", e))?;
    Ok(())
}

/// 保存到 `dir/discrepancy_report_YYYYmmdd_HHMMSS.csv`，同名已存在时追加序号，不覆盖历史报告
pub fn save_discrepancy_report(rows: &[DiscrepancyRow], dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| ReconError::io(dir, e))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let (path, file) = create_unique(dir, &stamp)?;
    write_discrepancy_report(rows, file)?;
    tracing::info!("Discrepancy report saved: {} ({} rows)", path.display(), rows.len());
    Ok(path)
}

/// create_new 独占创建；并发保存同一秒的报告时各自拿到不同序号
fn create_unique(dir: &Path, stamp: &str) -> Result<(PathBuf, File)> {
    let mut n = 0u32;
    loop {
        let path = if n == 0 {
            dir.join(format!("discrepancy_report_{stamp}.csv"))
        } else {
            dir.join(format!("discrepancy_report_{stamp}_{n}.csv"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(ReconError::io(&path, e)),
        }
    }
}

/// 回读时只保留评分需要的两列
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub vendor_name: String,
    /// 无法识别的严重程度为 None
    pub severity: Option<Severity>,
}

/// 一份历史报告
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub source: String,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportCorpus {
    pub artifacts: Vec<ReportArtifact>,
    pub skipped: Vec<SkippedSource>,
}

pub fn parse_report_artifact<R: Read>(source: &str, reader: R) -> Result<ReportArtifact> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let idx = |column: &str| -> Result<usize> {
        headers.iter().position(|h| h == column).ok_or_else(|| ReconError::MissingColumn {
            report: source.to_string(),
            column: column.to_string(),
        })
    };
    let vendor_idx = idx(VENDOR_COLUMN)?;
    let severity_idx = idx(SEVERITY_COLUMN)?;

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Report {}: skipping unreadable row {}: {}", source, line + 1, e);
                continue;
            }
        };
        let vendor_name = record
            .get(vendor_idx)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        let severity = record.get(severity_idx).and_then(|s| s.parse().ok());
        rows.push(ReportRow { vendor_name, severity });
    }

    Ok(ReportArtifact {
        source: source.to_string(),
        rows,
    })
}

pub fn read_report_artifact(path: &Path) -> Result<ReportArtifact> {
    let file = File::open(path).map_err(|e| ReconError::io(path, e))?;
    parse_report_artifact(&file_label(path), file)
}

/// 读取目录下全部历史报告 (只读，并行)；缺列或损坏的报告跳过
pub fn load_report_corpus(dir: impl AsRef<Path>) -> ReportCorpus {
    let dir = dir.as_ref();
    if !dir.exists() {
        tracing::warn!("Report folder not found: {}", dir.display());
        return ReportCorpus::default();
    }

    let files = match list_files(dir, "csv") {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("Cannot list report folder: {}", e);
            return ReportCorpus::default();
        }
    };

    let loaded: Vec<(String, Result<ReportArtifact>)> = files
        .par_iter()
        .map(|path| (file_label(path), read_report_artifact(path)))
        .collect();

    let mut corpus = ReportCorpus::default();
    for (source, result) in loaded {
        match result {
            Ok(artifact) => corpus.artifacts.push(artifact),
            Err(e) => {
                tracing::warn!("Skipping report {}: {}", source, e);
                corpus.skipped.push(SkippedSource {
                    source_file: source,
                    reason: e.to_string(),
                });
            }
        }
    }
    corpus
}
