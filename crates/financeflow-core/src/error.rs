//! Error types for FinanceFlow

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{message}")]
    DeleteFailed { status: u16, message: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
