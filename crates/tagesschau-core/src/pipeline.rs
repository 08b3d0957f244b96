use std::collections::HashSet;
use std::path::Path;

use polars::prelude::*;
use tagesschau_parser::{parse_episode_table, ParsedEpisodeTable};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::aggregate::aggregate_episodes;
use crate::classification::{classify_topics, without_classification, ClassifyOptions};
use crate::classifier::ZeroShotClassifier;
use crate::config::{CategorySet, OutputFormat, PipelineConfig};
use crate::dedup::deduplicate_episodes;
use crate::error::{PipelineError, Result};
use crate::outputs::{write_artifacts, OutputArtifacts, OutputTables};
use crate::quarantine::{quarantine_reoccurring, recount_topics};
use crate::schema::{EPISODE_ID, NUM_TOPICS, ROW_INDEX};
use crate::summary::{category_counts, ClassificationStatus, RunSummary};
use crate::temporal::normalize_timestamps;
use crate::unstack::unstack_topics;
use crate::validation::validate_integrity;

/// Reads and parses an episode CSV from disk.
pub fn load_input(path: &Path) -> Result<ParsedEpisodeTable> {
    let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let table = parse_episode_table(&content)?;
    info!(
        path = %path.display(),
        parser = %table.file_metadata.parser,
        rows = table.height(),
        "loaded episode table"
    );
    Ok(table)
}

/// Interruption flag checked between stages. Raising it makes the next check
/// fail with [`PipelineError::Aborted`]; an in-flight classification batch is
/// abandoned as well.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    receiver: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn new() -> (watch::Sender<bool>, Self) {
        let (sender, receiver) = watch::channel(false);
        (sender, Self { receiver })
    }

    /// A signal that is never raised.
    pub fn never() -> Self {
        Self::new().1
    }

    pub fn is_raised(&self) -> bool {
        *self.receiver.borrow()
    }

    fn check(&self, before: &str) -> Result<()> {
        if self.is_raised() {
            warn!(stage = before, "run interrupted");
            return Err(PipelineError::Aborted(format!("interrupted before {before}")));
        }
        Ok(())
    }

    async fn raised(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Episode table after temporal normalization, deduplication and aggregation.
#[derive(Debug, Clone)]
pub struct EpisodeStage {
    pub episodes: DataFrame,
    pub summary: RunSummary,
}

/// The three tables of a run plus its summary.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub episodes: DataFrame,
    pub topics: DataFrame,
    pub quarantined: DataFrame,
    pub summary: RunSummary,
}

impl RunOutput {
    pub fn tables(&self) -> OutputTables<'_> {
        OutputTables {
            episodes: &self.episodes,
            topics: &self.topics,
            reoccurring: &self.quarantined,
        }
    }
}

pub struct EpisodePipeline {
    config: PipelineConfig,
    categories: CategorySet,
}

impl EpisodePipeline {
    /// Validates `config` up front; nothing runs with an invalid category set.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let categories = config.validate()?;
        Ok(Self { config, categories })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Temporal normalizer, deduplicator and aggregator only.
    pub fn episodes(
        &self,
        table: &ParsedEpisodeTable,
        source: Option<String>,
    ) -> Result<EpisodeStage> {
        self.episodes_with_abort(table, source, &AbortSignal::never())
    }

    fn episodes_with_abort(
        &self,
        table: &ParsedEpisodeTable,
        source: Option<String>,
        abort: &AbortSignal,
    ) -> Result<EpisodeStage> {
        let mut summary = RunSummary::new(&table.file_metadata, source);

        abort.check("temporal normalization")?;
        let temporal = normalize_timestamps(&table.df)?;

        abort.check("deduplication")?;
        let deduped = deduplicate_episodes(&temporal.dataframe)?;
        summary.episodes.duplicates_removed = deduped.duplicates_removed;
        let overridden: HashSet<u32> = temporal.date_overrides.iter().copied().collect();
        let date_overrides = deduped
            .dataframe
            .column(ROW_INDEX)?
            .u32()?
            .into_iter()
            .flatten()
            .filter(|row| overridden.contains(row))
            .count();
        summary.record_rejections(&temporal.rejected_rows, date_overrides);

        abort.check("aggregation")?;
        let aggregated = aggregate_episodes(&deduped.dataframe)?;
        summary.episodes.episodes = aggregated.dataframe.height();
        summary.episodes.placeholder_descriptions = aggregated.placeholder_descriptions;

        Ok(EpisodeStage {
            episodes: aggregated.dataframe,
            summary,
        })
    }

    /// Every stage up to and including the quarantine recount. The returned
    /// topic table has no `category` column yet.
    pub fn prepare(
        &self,
        table: &ParsedEpisodeTable,
        source: Option<String>,
        abort: &AbortSignal,
    ) -> Result<RunOutput> {
        let EpisodeStage {
            episodes,
            mut summary,
        } = self.episodes_with_abort(table, source, abort)?;

        abort.check("topic unstacking")?;
        let unstacked = unstack_topics(&episodes)?;
        summary.topics.unstacked = unstacked.dataframe.height();
        summary.topics.blank_dropped = unstacked.blank_topics_dropped;
        summary.episodes.episodes_without_topics = unstacked.episodes_without_topics;

        abort.check("quarantine")?;
        let quarantine = quarantine_reoccurring(&unstacked.dataframe, &self.config.quarantine)?;
        summary.topics.quarantined_reoccurring = quarantine.reoccurring_rows;
        summary.topics.quarantined_weather = quarantine.weather_rows;
        summary.topics.quarantine_candidates = quarantine.candidates;

        let recount = recount_topics(&episodes, &quarantine.surviving, &quarantine.quarantined)?;
        summary.topics.surviving = recount.topics.height();
        summary.episodes.episodes_emptied_by_quarantine =
            emptied_by_quarantine(&recount.episodes, &unstacked.dataframe)?;

        validate_integrity(&recount.episodes, &recount.topics, &recount.quarantined)?;

        Ok(RunOutput {
            episodes: recount.episodes,
            topics: recount.topics,
            quarantined: recount.quarantined,
            summary,
        })
    }

    /// Runs the whole batch. With `classifier` set to `None` the `category`
    /// column is attached but left null.
    pub async fn run(
        &self,
        table: &ParsedEpisodeTable,
        source: Option<String>,
        classifier: Option<&dyn ZeroShotClassifier>,
        abort: &AbortSignal,
    ) -> Result<RunOutput> {
        let mut output = self.prepare(table, source, abort)?;

        abort.check("classification")?;
        match classifier {
            Some(classifier) => {
                let options = ClassifyOptions::from(&self.config.classifier);
                let classified = tokio::select! {
                    result = classify_topics(&output.topics, classifier, &self.categories, &options) => result?,
                    _ = abort.raised() => {
                        warn!(stage = "classification", "run interrupted");
                        return Err(PipelineError::Aborted(
                            "interrupted during classification".to_string(),
                        ));
                    }
                };
                let summary = &mut output.summary.classification;
                summary.status = ClassificationStatus::Completed;
                summary.distinct_texts = classified.distinct_texts;
                summary.classified_rows = classified.classified_rows;
                output.summary.record_failures(&classified.failures);
                output.summary.classification.category_counts =
                    category_counts(&classified.dataframe, &self.categories)?;
                output.topics = classified.dataframe;
            }
            None => {
                info!("classification skipped");
                output.topics = without_classification(&output.topics)?;
            }
        }

        validate_integrity(&output.episodes, &output.topics, &output.quarantined)?;

        info!(
            run_id = %output.summary.run_id,
            episodes = output.episodes.height(),
            topics = output.topics.height(),
            quarantined = output.quarantined.height(),
            "pipeline finished"
        );
        Ok(output)
    }

    /// Writes the run's artifacts in the configured format.
    pub fn persist(&self, output: &RunOutput, dir: &Path) -> Result<OutputArtifacts> {
        self.persist_as(output, dir, self.config.output.format)
    }

    pub fn persist_as(
        &self,
        output: &RunOutput,
        dir: &Path,
        format: OutputFormat,
    ) -> Result<OutputArtifacts> {
        Ok(write_artifacts(dir, format, output.tables(), &output.summary)?)
    }
}

/// Episodes that had at least one unstacked topic row and lost all of them to
/// quarantine. Episodes whose list was empty or only blanks never count.
fn emptied_by_quarantine(episodes: &DataFrame, unstacked: &DataFrame) -> Result<usize> {
    let with_rows: HashSet<u32> = unstacked
        .column(EPISODE_ID)?
        .u32()?
        .into_iter()
        .flatten()
        .collect();
    let ids = episodes.column(EPISODE_ID)?.u32()?;
    let counts = episodes.column(NUM_TOPICS)?.u32()?;
    Ok(ids
        .into_iter()
        .zip(counts)
        .filter(|(id, count)| {
            count.unwrap_or(0) == 0 && id.is_some_and(|id| with_rows.contains(&id))
        })
        .count())
}
