use std::collections::HashSet;

use polars::prelude::*;
use tracing::info;

use crate::schema::{TIMESTAMP, TITLE};

#[derive(Debug, Clone)]
pub struct DedupResult {
    pub dataframe: DataFrame,
    pub duplicates_removed: usize,
}

/// Drops every episode whose `(timestamp, title)` pair was already seen earlier
/// in the frame. The first occurrence wins and input order is kept.
///
/// The timestamp alone is not an identity: during breaking-news coverage two
/// different broadcasts can share a slot.
pub fn deduplicate_episodes(df: &DataFrame) -> Result<DedupResult, PolarsError> {
    let timestamps = df.column(TIMESTAMP)?.datetime()?;
    let titles = df.column(TITLE)?.str()?;

    let mut seen: HashSet<(Option<i64>, Option<&str>)> = HashSet::with_capacity(df.height());
    let keep: Vec<bool> = (0..df.height())
        .map(|idx| seen.insert((timestamps.get(idx), titles.get(idx))))
        .collect();

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let dataframe = df.filter(&mask)?;
    let duplicates_removed = df.height() - dataframe.height();

    info!(
        rows_in = df.height(),
        rows_out = dataframe.height(),
        duplicates_removed,
        "deduplicated episodes on (timestamp, title)"
    );

    Ok(DedupResult {
        dataframe,
        duplicates_removed,
    })
}
