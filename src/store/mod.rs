pub mod mappings;
pub mod reports;

use std::path::{Path, PathBuf};

use crate::error::{ReconError, Result};

pub use mappings::{load_mapping_corpus, load_mapping_source};
pub use reports::{
    load_report_corpus, parse_report_artifact, read_report_artifact, save_discrepancy_report,
    write_discrepancy_report, ReportArtifact, ReportCorpus, ReportRow,
};

/// 列出目录下指定扩展名的文件，按文件名升序
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ReconError::io(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
