use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::config::OutputFormat;
use crate::schema::{EPISODE_COLUMNS, TOPIC_COLUMNS};
use crate::summary::RunSummary;

pub const EPISODES_STEM: &str = "episodes";
pub const TOPICS_STEM: &str = "topics";
pub const REOCCURRING_STEM: &str = "reoccurring";
pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {table} table: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: PolarsError,
    },
    #[error("failed to serialize run summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// The three tables of a finished run.
#[derive(Debug, Clone, Copy)]
pub struct OutputTables<'a> {
    pub episodes: &'a DataFrame,
    pub topics: &'a DataFrame,
    pub reoccurring: &'a DataFrame,
}

/// Where each artifact ended up.
#[derive(Debug, Clone)]
pub struct OutputArtifacts {
    pub episodes: PathBuf,
    pub topics: PathBuf,
    pub reoccurring: PathBuf,
    pub summary: PathBuf,
}

/// Encodes all tables first, then moves each one into place through a temporary
/// file in `dir`, so readers never observe a partially written artifact.
pub fn write_artifacts(
    dir: &Path,
    format: OutputFormat,
    tables: OutputTables<'_>,
    summary: &RunSummary,
) -> Result<OutputArtifacts, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let episodes = encode_table(EPISODES_STEM, tables.episodes, &EPISODE_COLUMNS, format)?;
    let topics = encode_table(TOPICS_STEM, tables.topics, &TOPIC_COLUMNS, format)?;
    let reoccurring = encode_table(REOCCURRING_STEM, tables.reoccurring, &TOPIC_COLUMNS, format)?;
    let summary_bytes = serde_json::to_vec_pretty(summary)?;

    let ext = format.extension();
    let artifacts = OutputArtifacts {
        episodes: persist_atomically(dir, &format!("{EPISODES_STEM}.{ext}"), &episodes)?,
        topics: persist_atomically(dir, &format!("{TOPICS_STEM}.{ext}"), &topics)?,
        reoccurring: persist_atomically(dir, &format!("{REOCCURRING_STEM}.{ext}"), &reoccurring)?,
        summary: persist_atomically(dir, SUMMARY_FILE, &summary_bytes)?,
    };

    info!(
        dir = %dir.display(),
        format = %format,
        episodes = tables.episodes.height(),
        topics = tables.topics.height(),
        reoccurring = tables.reoccurring.height(),
        "persisted run artifacts"
    );

    Ok(artifacts)
}

fn encode_table(
    table: &'static str,
    df: &DataFrame,
    columns: &[&str],
    format: OutputFormat,
) -> Result<Vec<u8>, OutputError> {
    let encode_err = |source| OutputError::Encode { table, source };
    let mut selected = df.select(columns.iter().copied()).map_err(encode_err)?;

    let mut buffer = Vec::new();
    match format {
        OutputFormat::Parquet => {
            let mut cursor = Cursor::new(&mut buffer);
            ParquetWriter::new(&mut cursor)
                .with_compression(ParquetCompression::Zstd(None))
                .with_statistics(StatisticsOptions::default())
                .finish(&mut selected)
                .map_err(encode_err)?;
        }
        OutputFormat::Csv => {
            CsvWriter::new(&mut buffer)
                .include_header(true)
                .finish(&mut selected)
                .map_err(encode_err)?;
        }
    }
    Ok(buffer)
}

fn persist_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, OutputError> {
    let target = dir.join(file_name);
    let write_err = |source| OutputError::Write {
        path: target.display().to_string(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|err| write_err(err.error))?;

    Ok(target)
}
