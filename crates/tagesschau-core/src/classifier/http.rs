use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClassifierError, LabelScore, ZeroShotClassifier};

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    #[serde(default)]
    #[allow(dead_code)]
    sequence: Option<String>,
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// Client for a zero-shot classification endpoint that accepts
/// `{"inputs", "parameters": {"candidate_labels"}}` and answers with parallel
/// `labels` / `scores` lists.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, token)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ZeroShotClassifier for HttpClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::InvalidInput(
                "topic text is empty".to_string(),
            ));
        }

        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ClassifierError::Service(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::InvalidInput(format!("HTTP {status}: {message}")));
        }
        if !status.is_success() {
            return Err(ClassifierError::Service(format!("HTTP {status}")));
        }

        let parsed: ZeroShotResponse = response
            .json()
            .await
            .map_err(|err| ClassifierError::MalformedResponse(err.to_string()))?;

        debug!(topic = text, labels = parsed.labels.len(), "classification response");
        pair_scores(parsed.labels, parsed.scores)
    }
}

fn pair_scores(labels: Vec<String>, scores: Vec<f64>) -> Result<Vec<LabelScore>, ClassifierError> {
    if labels.len() != scores.len() {
        return Err(ClassifierError::MalformedResponse(format!(
            "{} labels but {} scores",
            labels.len(),
            scores.len()
        )));
    }
    Ok(labels
        .into_iter()
        .zip(scores)
        .map(|(label, score)| LabelScore { label, score })
        .collect())
}
