use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use polars::prelude::*;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::classifier::{ClassifierError, LabelScore, ZeroShotClassifier};
use crate::config::{CategorySet, ClassifierConfig};
use crate::schema::{CATEGORY, TOPIC_TEXT};

#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    /// Upper bound on in-flight service calls.
    pub concurrency: usize,
    pub timeout: Duration,
}

impl From<&ClassifierConfig> for ClassifyOptions {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            timeout: config.timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassificationFailure {
    pub topic_text: String,
    /// Number of topic rows left without a category by this failure.
    pub rows: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub dataframe: DataFrame,
    pub distinct_texts: usize,
    pub classified_rows: usize,
    pub failures: Vec<ClassificationFailure>,
}

/// Picks the highest scoring label. Ties go to the label seen first in the
/// response. The response has to name every configured category and nothing else.
pub fn select_category(
    scores: &[LabelScore],
    categories: &CategorySet,
) -> Result<String, ClassifierError> {
    if let Some(unknown) = scores.iter().find(|s| !categories.contains(&s.label)) {
        return Err(ClassifierError::MalformedResponse(format!(
            "unknown label '{}'",
            unknown.label
        )));
    }
    if let Some(missing) = categories
        .labels()
        .iter()
        .find(|label| !scores.iter().any(|s| &s.label == *label))
    {
        return Err(ClassifierError::MalformedResponse(format!(
            "no score for category '{missing}'"
        )));
    }
    if scores.iter().any(|s| s.score.is_nan()) {
        return Err(ClassifierError::MalformedResponse(
            "score is not a number".to_string(),
        ));
    }

    let mut best: Option<&LabelScore> = None;
    for candidate in scores {
        if best.is_none_or(|current| candidate.score > current.score) {
            best = Some(candidate);
        }
    }
    best.map(|s| s.label.clone())
        .ok_or_else(|| ClassifierError::MalformedResponse("empty response".to_string()))
}

async fn classify_one(
    classifier: &dyn ZeroShotClassifier,
    text: &str,
    categories: &CategorySet,
    limit: Duration,
) -> Result<String, ClassifierError> {
    match timeout(limit, classifier.classify(text, categories.labels())).await {
        Ok(Ok(scores)) => select_category(&scores, categories),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(ClassifierError::Timeout(limit)),
    }
}

/// Adds a `category` column to the surviving topic table.
///
/// Every distinct `topic_text` is sent to the service once, with at most
/// `options.concurrency` calls in flight and each call bounded by
/// `options.timeout`. A failed call only leaves its own rows uncategorized; it
/// is recorded in [`ClassificationResult::failures`] and the batch carries on.
pub async fn classify_topics(
    topics: &DataFrame,
    classifier: &dyn ZeroShotClassifier,
    categories: &CategorySet,
    options: &ClassifyOptions,
) -> Result<ClassificationResult, PolarsError> {
    let texts = topics.column(TOPIC_TEXT)?.str()?;

    let mut slot_by_text: HashMap<&str, usize> = HashMap::new();
    let mut distinct: Vec<&str> = Vec::new();
    let mut row_slots: Vec<Option<usize>> = Vec::with_capacity(topics.height());
    for text in texts.into_iter() {
        row_slots.push(text.map(|text| {
            *slot_by_text.entry(text).or_insert_with(|| {
                distinct.push(text);
                distinct.len() - 1
            })
        }));
    }

    info!(
        rows = topics.height(),
        distinct_texts = distinct.len(),
        concurrency = options.concurrency,
        "classifying topics"
    );

    let limit = options.timeout;
    let outcomes: Vec<(usize, Result<String, ClassifierError>)> =
        stream::iter(distinct.iter().copied().enumerate())
            .map(|(slot, text)| async move {
                let outcome = classify_one(classifier, text, categories, limit).await;
                debug!(slot, topic = text, ok = outcome.is_ok(), "classification finished");
                (slot, outcome)
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await;

    let mut results: Vec<Option<Result<String, ClassifierError>>> = vec![None; distinct.len()];
    for (slot, outcome) in outcomes {
        results[slot] = Some(outcome);
    }

    let mut rows_per_slot = vec![0usize; distinct.len()];
    for slot in row_slots.iter().flatten() {
        rows_per_slot[*slot] += 1;
    }

    let categories_column: Vec<Option<&str>> = row_slots
        .iter()
        .map(|slot| match slot.and_then(|slot| results[slot].as_ref()) {
            Some(Ok(category)) => Some(category.as_str()),
            _ => None,
        })
        .collect();
    let classified_rows = categories_column.iter().filter(|c| c.is_some()).count();

    let mut failures = Vec::new();
    for (slot, result) in results.iter().enumerate() {
        let reason = match result {
            Some(Ok(_)) => continue,
            Some(Err(err)) => err.to_string(),
            None => "no result collected".to_string(),
        };
        warn!(topic = distinct[slot], reason = %reason, "classification failed");
        failures.push(ClassificationFailure {
            topic_text: distinct[slot].to_string(),
            rows: rows_per_slot[slot],
            reason,
        });
    }

    let mut dataframe = topics.clone();
    dataframe.with_column(Series::new(CATEGORY.into(), categories_column))?;

    info!(
        classified_rows,
        failed_texts = failures.len(),
        "classification finished"
    );

    Ok(ClassificationResult {
        dataframe,
        distinct_texts: distinct.len(),
        classified_rows,
        failures,
    })
}

/// Attaches an all-null `category` column, for runs that skip the service.
pub fn without_classification(topics: &DataFrame) -> Result<DataFrame, PolarsError> {
    let mut dataframe = topics.clone();
    let height = dataframe.height();
    dataframe.with_column(Series::full_null(CATEGORY.into(), height, &DataType::String))?;
    Ok(dataframe)
}
