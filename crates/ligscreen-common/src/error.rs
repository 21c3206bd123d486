use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LigscreenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("'{tool}' not found. Make sure it is installed and in your PATH")]
    ToolNotFound { tool: String },

    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, LigscreenError>;
