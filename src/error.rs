use std::path::PathBuf;

use thiserror::Error;

/// 存储层与配置层错误。核心匹配流程不返回错误，只在加载/保存时使用。
#[derive(Debug, Error)]
pub enum ReconError {
    /// 配置加载失败 (文件 / 环境变量)
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// 配置取值越界
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 单个映射文件无法解析
    #[error("malformed mapping source '{source_file}': {reason}")]
    MalformedMapping { source_file: String, reason: String },

    /// 历史报告缺少必要列
    #[error("report '{report}': missing column '{column}'")]
    MissingColumn { report: String, column: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
