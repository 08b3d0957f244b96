use polars::prelude::*;
use tracing::info;

use crate::aggregate::split_topics;
use crate::schema::{RAW_TOPICS, TOPIC_TEXT};

#[derive(Debug, Clone)]
pub struct UnstackResult {
    pub dataframe: DataFrame,
    pub episodes_without_topics: usize,
    pub blank_topics_dropped: usize,
}

/// Fans every episode out into one row per topic.
///
/// Each topic row carries a copy of all episode columns plus the trimmed
/// `topic_text`. Episodes with an empty or missing topic list produce no rows,
/// and parts that are blank after trimming are discarded.
pub fn unstack_topics(episodes: &DataFrame) -> Result<UnstackResult, PolarsError> {
    let raw_topics = episodes.column(RAW_TOPICS)?.str()?;

    let mut indices: Vec<IdxSize> = Vec::new();
    let mut topic_texts: Vec<String> = Vec::new();
    let mut episodes_without_topics = 0usize;
    let mut blank_topics_dropped = 0usize;

    for idx in 0..episodes.height() {
        let parts = split_topics(raw_topics.get(idx));
        if parts.is_empty() {
            episodes_without_topics += 1;
            continue;
        }
        for part in parts {
            let text = part.trim();
            if text.is_empty() {
                blank_topics_dropped += 1;
                continue;
            }
            indices.push(idx as IdxSize);
            topic_texts.push(text.to_string());
        }
    }

    let take = IdxCa::from_vec("episode_row".into(), indices);
    let mut dataframe = episodes.drop(RAW_TOPICS)?.take(&take)?;
    dataframe.with_column(Series::new(TOPIC_TEXT.into(), topic_texts))?;

    info!(
        episodes = episodes.height(),
        topics = dataframe.height(),
        episodes_without_topics,
        blank_topics_dropped,
        "unstacked topic lists"
    );

    Ok(UnstackResult {
        dataframe,
        episodes_without_topics,
        blank_topics_dropped,
    })
}
