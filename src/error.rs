use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DroidcovError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    /// A result directory name does not follow the `<app>...#<issue>.<apk>.apk...`
    /// convention.
    #[error("Malformed result directory '{}': {reason}", .dir.display())]
    Naming { dir: PathBuf, reason: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, DroidcovError>;
