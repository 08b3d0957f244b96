use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::errors::{ParserError, TimestampError};

const BROADCAST_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";
const SCRAPED_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Default)]
pub struct RawColumns {
    pub date: Vec<String>,
    pub time_text: Vec<String>,
    pub title: Vec<String>,
    pub article: Vec<Option<String>>,
}

impl RawColumns {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            date: Vec::with_capacity(capacity),
            time_text: Vec::with_capacity(capacity),
            title: Vec::with_capacity(capacity),
            article: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.time_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_text.is_empty()
    }
}

pub(crate) fn build_raw_dataframe(
    parser: &'static str,
    columns: RawColumns,
) -> Result<DataFrame, ParserError> {
    let rows = columns.len();
    if columns.date.len() != rows || columns.title.len() != rows || columns.article.len() != rows
    {
        return Err(ParserError::Validation {
            parser,
            message: format!(
                "column lengths diverged: date={}, time_text={}, title={}, article={}",
                columns.date.len(),
                rows,
                columns.title.len(),
                columns.article.len()
            ),
        });
    }

    let row_index: Vec<u32> = (0..rows as u32).collect();

    DataFrame::new(vec![
        Series::new("row_index".into(), row_index).into(),
        Series::new("date".into(), columns.date).into(),
        Series::new("time_text".into(), columns.time_text).into(),
        Series::new("title".into(), columns.title).into(),
        Series::new("article".into(), columns.article).into(),
    ])
    .map_err(|err| ParserError::Validation {
        parser,
        message: format!("failed to build raw episode dataframe: {err}"),
    })
}

/// Parses the scraped "dachzeile" timestamp, e.g. `23.06.2020 00:15 Uhr`.
///
/// The locale suffix is optional, but anything after the minutes that is not a
/// single alphabetic word is rejected.
pub fn parse_broadcast_timestamp(value: &str) -> Result<NaiveDateTime, TimestampError> {
    const FIELD: &str = "time_text";
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty { field: FIELD });
    }

    let (timestamp, remainder) =
        NaiveDateTime::parse_and_remainder(trimmed, BROADCAST_TIMESTAMP_FORMAT).map_err(
            |err| TimestampError::Invalid {
                field: FIELD,
                value: trimmed.to_string(),
                message: err.to_string(),
            },
        )?;

    let suffix = remainder.trim();
    if !suffix.is_empty() && !suffix.chars().all(char::is_alphabetic) {
        return Err(TimestampError::TrailingText {
            field: FIELD,
            value: trimmed.to_string(),
            suffix: suffix.to_string(),
        });
    }

    Ok(timestamp)
}

pub fn parse_scraped_date(value: &str) -> Result<NaiveDate, TimestampError> {
    const FIELD: &str = "date";
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty { field: FIELD });
    }
    NaiveDate::parse_from_str(trimmed, SCRAPED_DATE_FORMAT).map_err(|err| {
        TimestampError::Invalid {
            field: FIELD,
            value: trimmed.to_string(),
            message: err.to_string(),
        }
    })
}

pub(crate) fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_string())
}
