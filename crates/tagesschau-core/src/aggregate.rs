use polars::lazy::dsl::*;
use polars::prelude::*;
use tracing::info;

use crate::schema::{
    DATE, DESCRIPTION_LENGTH, EPISODES_THAT_DAY, EPISODE_ID, NUM_TOPICS, RAW_TOPICS, ROW_INDEX,
    TITLE,
};

pub const TOPIC_DELIMITER: char = ',';

#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub dataframe: DataFrame,
    pub placeholder_descriptions: usize,
}

/// A lone punctuation mark such as `-` is what the scraper stores for an
/// episode without a topic list. A single letter is a real topic.
pub fn is_placeholder(raw_topics: &str) -> bool {
    let mut chars = raw_topics.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_alphanumeric())
}

/// Fills nulls left by a left join on a `u32` count column with zero.
pub(crate) fn fill_missing_counts(df: &mut DataFrame, column: &str) -> Result<(), PolarsError> {
    let filled = df.column(column)?.u32()?.fill_null_with_values(0)?;
    df.with_column(filled.into_series())?;
    Ok(())
}

/// Splits a raw topic field into its comma-delimited parts. Missing values
/// give an empty list; the parts are not trimmed yet.
pub fn split_topics(raw_topics: Option<&str>) -> Vec<&str> {
    match raw_topics {
        Some(text) => text.split(TOPIC_DELIMITER).collect(),
        None => Vec::new(),
    }
}

/// Assigns dense `episode_id`s in frame order, normalizes titles and the
/// placeholder topic field, and joins the per-day episode count onto every row.
pub fn aggregate_episodes(df: &DataFrame) -> Result<AggregateResult, PolarsError> {
    let height = df.height();
    let titles = df.column(TITLE)?.str()?;
    let raw_topics = df.column(RAW_TOPICS)?.str()?;

    let mut episode_ids: Vec<u32> = Vec::with_capacity(height);
    let mut normalized_titles: Vec<Option<String>> = Vec::with_capacity(height);
    let mut topics_out: Vec<Option<&str>> = Vec::with_capacity(height);
    let mut description_lengths: Vec<u32> = Vec::with_capacity(height);
    let mut num_topics: Vec<u32> = Vec::with_capacity(height);
    let mut placeholder_descriptions = 0usize;

    for idx in 0..height {
        episode_ids.push(idx as u32);
        normalized_titles.push(titles.get(idx).map(|title| title.trim().to_lowercase()));

        let mut topics = raw_topics.get(idx);
        let mut description_length = topics.map_or(0, |text| text.chars().count() as u32);
        if topics.is_some_and(is_placeholder) {
            topics = None;
            description_length = 0;
            placeholder_descriptions += 1;
        }

        num_topics.push(split_topics(topics).len() as u32);
        description_lengths.push(description_length);
        topics_out.push(topics);
    }

    let mut with_ids = df.drop(ROW_INDEX).unwrap_or_else(|_| df.clone());
    with_ids.with_column(Series::new(EPISODE_ID.into(), episode_ids))?;
    with_ids.with_column(Series::new(TITLE.into(), normalized_titles))?;
    with_ids.with_column(Series::new(RAW_TOPICS.into(), topics_out))?;
    with_ids.with_column(Series::new(DESCRIPTION_LENGTH.into(), description_lengths))?;
    with_ids.with_column(Series::new(NUM_TOPICS.into(), num_topics))?;

    let per_day = with_ids
        .clone()
        .lazy()
        .group_by([col(DATE)])
        .agg([len().cast(DataType::UInt32).alias(EPISODES_THAT_DAY)]);

    let mut dataframe = with_ids
        .lazy()
        .join(
            per_day,
            [col(DATE)],
            [col(DATE)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([EPISODE_ID], SortMultipleOptions::default())
        .collect()?;
    fill_missing_counts(&mut dataframe, EPISODES_THAT_DAY)?;

    info!(
        episodes = dataframe.height(),
        placeholder_descriptions, "assigned episode ids and per-day counts"
    );

    Ok(AggregateResult {
        dataframe,
        placeholder_descriptions,
    })
}
