//! Boundary to the external zero-shot text classification service.
//!
//! # Implementations
//! - [`http::HttpClassifier`]: Hugging Face style zero-shot inference endpoint via `reqwest`.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpClassifier;

/// One `(label, score)` pair of a classification response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassifierError {
    #[error("service rejected input: {0}")]
    InvalidInput(String),

    #[error("classification timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("malformed service response: {0}")]
    MalformedResponse(String),

    #[error("service error: {0}")]
    Service(String),
}

/// A text classifier scoring one input against a fixed list of labels.
///
/// The response is expected to cover every requested label, in whatever order
/// the service ranks them.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError>;
}
