use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use polars::prelude::*;
use serde::Serialize;
use tagesschau_parser::FileMetadata;
use uuid::Uuid;

use crate::classification::ClassificationFailure;
use crate::config::CategorySet;
use crate::quarantine::QuarantineCandidate;
use crate::schema::CATEGORY;
use crate::temporal::RejectedRow;

pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Upper bound on offending values copied into the summary per error kind.
pub const SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: String,
    pub pipeline_version: &'static str,
    pub input: InputSummary,
    pub temporal: TemporalSummary,
    pub episodes: EpisodeSummary,
    pub topics: TopicSummary,
    pub classification: ClassificationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub parser: String,
    pub content_hash: String,
    pub raw_rows: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemporalSummary {
    pub rejected_rows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_samples: Vec<RejectedRow>,
    /// Deduplicated episodes whose scraped date was replaced by the date of
    /// their timestamp.
    pub date_overrides: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodeSummary {
    pub duplicates_removed: usize,
    pub episodes: usize,
    pub placeholder_descriptions: usize,
    pub episodes_without_topics: usize,
    pub episodes_emptied_by_quarantine: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopicSummary {
    pub unstacked: usize,
    pub blank_dropped: usize,
    pub quarantined_reoccurring: usize,
    pub quarantined_weather: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quarantine_candidates: Vec<QuarantineCandidate>,
    pub surviving: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStatus {
    #[default]
    Skipped,
    Completed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationSummary {
    pub status: ClassificationStatus,
    pub distinct_texts: usize,
    pub classified_rows: usize,
    pub failed_texts: usize,
    pub failed_rows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failure_samples: Vec<ClassificationFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_counts: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub rows: usize,
}

impl RunSummary {
    pub fn new(metadata: &FileMetadata, path: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            pipeline_version: PIPELINE_VERSION,
            input: InputSummary {
                path,
                parser: metadata.parser.clone(),
                content_hash: metadata.content_hash.clone(),
                raw_rows: metadata.row_count,
            },
            temporal: TemporalSummary::default(),
            episodes: EpisodeSummary::default(),
            topics: TopicSummary::default(),
            classification: ClassificationSummary::default(),
        }
    }

    pub fn record_rejections(&mut self, rejected: &[RejectedRow], date_overrides: usize) {
        self.temporal = TemporalSummary {
            rejected_rows: rejected.len(),
            rejected_samples: rejected.iter().take(SAMPLE_LIMIT).cloned().collect(),
            date_overrides,
        };
    }

    pub fn record_failures(&mut self, failures: &[ClassificationFailure]) {
        self.classification.failed_texts = failures.len();
        self.classification.failed_rows = failures.iter().map(|f| f.rows).sum();
        self.classification.failure_samples = failures.iter().take(SAMPLE_LIMIT).cloned().collect();
    }

    /// Label/value pairs for a compact terminal report.
    pub fn report_rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("run id".to_string(), self.run_id.to_string()),
            ("raw rows".to_string(), self.input.raw_rows.to_string()),
            ("rejected rows".to_string(), self.temporal.rejected_rows.to_string()),
            ("proof date overrides".to_string(), self.temporal.date_overrides.to_string()),
            ("duplicates removed".to_string(), self.episodes.duplicates_removed.to_string()),
            ("episodes".to_string(), self.episodes.episodes.to_string()),
            ("topics unstacked".to_string(), self.topics.unstacked.to_string()),
            (
                "quarantined (reoccurring / weather)".to_string(),
                format!(
                    "{} / {}",
                    self.topics.quarantined_reoccurring, self.topics.quarantined_weather
                ),
            ),
            ("surviving topics".to_string(), self.topics.surviving.to_string()),
        ];
        match self.classification.status {
            ClassificationStatus::Skipped => {
                rows.push(("classification".to_string(), "skipped".to_string()));
            }
            ClassificationStatus::Completed => {
                rows.push((
                    "classified rows".to_string(),
                    self.classification.classified_rows.to_string(),
                ));
                rows.push((
                    "failed texts (rows)".to_string(),
                    format!(
                        "{} ({})",
                        self.classification.failed_texts, self.classification.failed_rows
                    ),
                ));
                for count in &self.classification.category_counts {
                    rows.push((format!("  {}", count.category), count.rows.to_string()));
                }
            }
        }
        rows
    }
}

/// Rows per category in configured order; categories without rows are listed with zero.
pub fn category_counts(
    topics: &DataFrame,
    categories: &CategorySet,
) -> Result<Vec<CategoryCount>, PolarsError> {
    let assigned = topics.column(CATEGORY)?.str()?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for category in assigned.into_iter().flatten() {
        *counts.entry(category).or_insert(0) += 1;
    }
    Ok(categories
        .labels()
        .iter()
        .map(|label| CategoryCount {
            category: label.clone(),
            rows: counts.get(label.as_str()).copied().unwrap_or(0),
        })
        .collect())
}
