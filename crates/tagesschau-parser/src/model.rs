use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The four text columns every raw episode table has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawColumn {
    Date,
    TimeText,
    Title,
    Article,
}

impl RawColumn {
    pub const ALL: [RawColumn; 4] = [
        RawColumn::Date,
        RawColumn::TimeText,
        RawColumn::Title,
        RawColumn::Article,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RawColumn::Date => "date",
            RawColumn::TimeText => "time_text",
            RawColumn::Title => "title",
            RawColumn::Article => "article",
        }
    }
}

impl fmt::Display for RawColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RawColumn {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(RawColumn::Date),
            "time_text" => Ok(RawColumn::TimeText),
            "title" => Ok(RawColumn::Title),
            "article" => Ok(RawColumn::Article),
            other => Err(format!("unknown column '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub parser: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub content_hash: String,
}

/// Raw episode records exactly as scraped: `row_index`, `date`, `time_text`,
/// `title` and a nullable `article` column.
#[derive(Debug, Clone)]
pub struct ParsedEpisodeTable {
    pub file_metadata: FileMetadata,
    pub df: DataFrame,
}

impl ParsedEpisodeTable {
    pub fn height(&self) -> usize {
        self.df.height()
    }
}
