use std::io;

use thiserror::Error;

/// Errors raised while loading, configuring, or exporting a contract report.
///
/// Per-cell parse failures never surface here; they become absent values
/// inside the normalized table.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("currency '{code}' is not in the rate table")]
    UnsupportedCurrency { code: String },
    #[error("'{0}' is not a supported display currency (expected one of USD, EUR, GBP, CHF, DKK, NOK, SEK)")]
    UnknownDisplayCurrency(String),
}

impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        ReportError::Config(err.to_string())
    }
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
