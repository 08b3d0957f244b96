// Post-aggregation invariants. Any failure here means a stage produced
// inconsistent tables, so the run stops instead of persisting them.

use std::collections::HashMap;

use polars::prelude::*;
use thiserror::Error;

use crate::schema::{EPISODE_ID, NUM_TOPICS};

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("episode table contains a null episode_id")]
    NullEpisodeId,
    #[error("episode_id {0} appears more than once in the episode table")]
    DuplicateEpisodeId(u32),
    #[error("{table} table has a row without an episode_id")]
    MissingParent { table: &'static str },
    #[error("{table} table references unknown episode_id {episode_id}")]
    OrphanTopic {
        table: &'static str,
        episode_id: u32,
    },
    #[error("episode {episode_id} records num_topics={recorded} but has {actual} topic rows")]
    TopicCountMismatch {
        episode_id: u32,
        recorded: u32,
        actual: u32,
    },
}

/// Checks the episode and topic tables against each other:
/// unique episode ids, no orphan topic rows (surviving or quarantined), and
/// `num_topics` equal to the number of surviving topic rows per episode.
pub fn validate_integrity(
    episodes: &DataFrame,
    topics: &DataFrame,
    quarantined: &DataFrame,
) -> Result<(), IntegrityError> {
    let ids = episodes.column(EPISODE_ID)?.u32()?;
    let recorded = episodes.column(NUM_TOPICS)?.u32()?;

    let mut recorded_by_episode: HashMap<u32, u32> = HashMap::with_capacity(episodes.height());
    for (id, count) in ids.into_iter().zip(recorded) {
        let id = id.ok_or(IntegrityError::NullEpisodeId)?;
        if recorded_by_episode
            .insert(id, count.unwrap_or(0))
            .is_some()
        {
            return Err(IntegrityError::DuplicateEpisodeId(id));
        }
    }

    let mut actual_by_episode: HashMap<u32, u32> = HashMap::new();
    for id in topic_parents(topics, "topic", &recorded_by_episode)? {
        *actual_by_episode.entry(id).or_insert(0) += 1;
    }
    topic_parents(quarantined, "quarantine", &recorded_by_episode)?;

    let mut mismatches: Vec<(u32, u32, u32)> = recorded_by_episode
        .iter()
        .filter_map(|(id, recorded)| {
            let actual = actual_by_episode.get(id).copied().unwrap_or(0);
            (actual != *recorded).then_some((*id, *recorded, actual))
        })
        .collect();
    mismatches.sort_unstable();

    if let Some((episode_id, recorded, actual)) = mismatches.into_iter().next() {
        return Err(IntegrityError::TopicCountMismatch {
            episode_id,
            recorded,
            actual,
        });
    }

    Ok(())
}

fn topic_parents(
    table: &DataFrame,
    name: &'static str,
    known: &HashMap<u32, u32>,
) -> Result<Vec<u32>, IntegrityError> {
    let parents = table.column(EPISODE_ID)?.u32()?;
    let mut ids = Vec::with_capacity(table.height());
    for parent in parents.into_iter() {
        let id = parent.ok_or(IntegrityError::MissingParent { table: name })?;
        if !known.contains_key(&id) {
            return Err(IntegrityError::OrphanTopic {
                table: name,
                episode_id: id,
            });
        }
        ids.push(id);
    }
    Ok(ids)
}
