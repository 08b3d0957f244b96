// crates/tagesschau-core/src/error.rs

use thiserror::Error;

use crate::config::ConfigError;
use crate::outputs::OutputError;
use crate::temporal::TemporalError;
use crate::validation::IntegrityError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input could not be parsed: {0}")]
    Parser(#[from] tagesschau_parser::ParserError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Timestamp normalization failed: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Configuration invalid: {0}")]
    Config(#[from] ConfigError),

    #[error("Integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Writing outputs failed: {0}")]
    Output(#[from] OutputError),

    #[error("Run aborted: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
