use std::collections::{HashMap, HashSet};

use polars::lazy::dsl::*;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::fill_missing_counts;
use crate::config::QuarantineConfig;
use crate::schema::{CATEGORY, EPISODE_ID, NUM_TOPICS, TOPIC_TEXT};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuarantineCandidate {
    pub topic: String,
    pub frequency: usize,
}

#[derive(Debug, Clone)]
pub struct QuarantineResult {
    pub surviving: DataFrame,
    pub quarantined: DataFrame,
    /// Case-folded topic texts above the frequency threshold, most frequent first.
    pub candidates: Vec<QuarantineCandidate>,
    pub reoccurring_rows: usize,
    pub weather_rows: usize,
}

#[derive(Debug, Clone)]
pub struct RecountResult {
    pub episodes: DataFrame,
    pub topics: DataFrame,
    pub quarantined: DataFrame,
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Moves recurring segment labels and weather segments out of the topic table.
///
/// A case-folded topic text occurring more than `threshold` times across the
/// whole table is quarantined on every row it appears; rows containing the
/// weather pattern are quarantined regardless of frequency. The quarantined
/// frame gets an all-null `category` column.
pub fn quarantine_reoccurring(
    topics: &DataFrame,
    config: &QuarantineConfig,
) -> Result<QuarantineResult, PolarsError> {
    let texts = topics.column(TOPIC_TEXT)?.str()?;
    let folded: Vec<Option<String>> = texts.into_iter().map(|t| t.map(fold)).collect();

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for text in folded.iter().flatten() {
        *frequencies.entry(text.as_str()).or_insert(0) += 1;
    }

    let mut candidates: Vec<QuarantineCandidate> = frequencies
        .iter()
        .filter(|(_, count)| **count > config.threshold)
        .map(|(topic, count)| QuarantineCandidate {
            topic: topic.to_string(),
            frequency: *count,
        })
        .collect();
    candidates.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.topic.cmp(&b.topic)));
    let candidate_set: HashSet<&str> = candidates.iter().map(|c| c.topic.as_str()).collect();

    let weather_pattern = fold(&config.weather_pattern);
    let mut reoccurring_rows = 0usize;
    let mut weather_rows = 0usize;
    let quarantine_mask: Vec<bool> = folded
        .iter()
        .map(|text| {
            let Some(text) = text else {
                return false;
            };
            if candidate_set.contains(text.as_str()) {
                reoccurring_rows += 1;
                true
            } else if text.contains(&weather_pattern) {
                weather_rows += 1;
                true
            } else {
                false
            }
        })
        .collect();

    let mask = BooleanChunked::from_slice("quarantine".into(), &quarantine_mask);
    let mut quarantined = topics.filter(&mask)?;
    let surviving = topics.filter(&!&mask)?;

    let height = quarantined.height();
    quarantined.with_column(Series::full_null(CATEGORY.into(), height, &DataType::String))?;

    for candidate in &candidates {
        debug!(topic = %candidate.topic, frequency = candidate.frequency, "quarantine candidate");
    }
    info!(
        topics_in = topics.height(),
        surviving = surviving.height(),
        reoccurring_rows,
        weather_rows,
        candidates = candidates.len(),
        "quarantined reoccurring topics"
    );

    Ok(QuarantineResult {
        surviving,
        quarantined,
        candidates,
        reoccurring_rows,
        weather_rows,
    })
}

/// Recomputes `num_topics` from the surviving topic rows and writes it back
/// onto the episode table (left join, zero for episodes without survivors) and
/// onto both topic tables.
pub fn recount_topics(
    episodes: &DataFrame,
    surviving: &DataFrame,
    quarantined: &DataFrame,
) -> Result<RecountResult, PolarsError> {
    let per_episode = surviving
        .clone()
        .lazy()
        .group_by([col(EPISODE_ID)])
        .agg([len().cast(DataType::UInt32).alias(NUM_TOPICS)]);

    let mut episodes = episodes
        .drop(NUM_TOPICS)?
        .lazy()
        .join(
            per_episode,
            [col(EPISODE_ID)],
            [col(EPISODE_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([EPISODE_ID], SortMultipleOptions::default())
        .collect()?;
    fill_missing_counts(&mut episodes, NUM_TOPICS)?;

    let ids = episodes.column(EPISODE_ID)?.u32()?;
    let counts = episodes.column(NUM_TOPICS)?.u32()?;
    let by_episode: HashMap<u32, u32> = ids
        .into_iter()
        .zip(counts)
        .filter_map(|(id, count)| Some((id?, count.unwrap_or(0))))
        .collect();

    let topics = assign_topic_counts(surviving, &by_episode)?;
    let quarantined = assign_topic_counts(quarantined, &by_episode)?;

    let emptied = by_episode.values().filter(|count| **count == 0).count();
    info!(
        episodes = episodes.height(),
        episodes_without_surviving_topics = emptied,
        "recounted topics per episode"
    );

    Ok(RecountResult {
        episodes,
        topics,
        quarantined,
    })
}

fn assign_topic_counts(
    topics: &DataFrame,
    by_episode: &HashMap<u32, u32>,
) -> Result<DataFrame, PolarsError> {
    let ids = topics.column(EPISODE_ID)?.u32()?;
    let counts: Vec<Option<u32>> = ids
        .into_iter()
        .map(|id| id.and_then(|id| by_episode.get(&id).copied()))
        .collect();
    let mut output = topics.clone();
    output.with_column(Series::new(NUM_TOPICS.into(), counts))?;
    Ok(output)
}
