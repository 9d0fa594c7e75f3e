//! Error types for the calculator.
//!
//! Validation failures are expected and user-correctable; export failures are
//! operation failures that the caller reports without aborting a calculation.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::ValidationFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// At least one blocking validation failure. The full list is kept in
    /// check order; the first entry is what gets shown.
    #[error("{}", first_message(.0))]
    Validation(Vec<ValidationFailure>),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl Error {
    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            Error::Validation(failures) => failures,
            Error::Export(_) => &[],
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no data to export")]
    NoData,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid share URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

fn first_message(failures: &[ValidationFailure]) -> &str {
    failures
        .first()
        .map(|f| f.message.as_str())
        .unwrap_or("invalid input")
}
