use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapfError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Instance Error in {path:?} (line {line}): {message}")]
    Instance {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Validation Error: {0}")]
    Validation(String),
}

pub type MapfResult<T> = Result<T, MapfError>;
