//! Единый тип ошибок публичного API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KassaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config persist failed after render: {0}")]
    ConfigPersist(String),
}

pub type Result<T> = std::result::Result<T, KassaError>;
