use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use polars::prelude::*;
use serde::Serialize;
use tagesschau_parser::{parse_broadcast_timestamp, parse_scraped_date};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schema::{
    DATE, DAY, MONTH, QUARTER, RAW_TOPICS, ROW_INDEX, TIMESLOT, TIMESTAMP, TITLE, WEEKDAY_NAME,
    YEAR,
};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, polars' `Date` epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const TIMESLOT_MINUTES: u32 = 20;

#[derive(Debug, Error)]
pub enum TemporalError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// A raw record excluded because its timestamp or scraped date did not parse.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RejectedRow {
    pub row_index: u32,
    pub time_text: String,
    pub date: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct TemporalResult {
    pub dataframe: DataFrame,
    pub rejected_rows: Vec<RejectedRow>,
    /// `row_index` of every row whose scraped date disagreed with the date of
    /// its timestamp, duplicates included.
    pub date_overrides: Vec<u32>,
}

/// Floors `hour * 100 + minute` to a multiple of 20, e.g. 14:37 -> 1420.
pub fn timeslot(timestamp: &NaiveDateTime) -> i32 {
    let military = timestamp.hour() * 100 + timestamp.minute();
    (military - military % TIMESLOT_MINUTES) as i32
}

pub fn quarter_label(timestamp: &NaiveDateTime) -> String {
    let quarter = (timestamp.month() - 1) / 3 + 1;
    format!("{}/{}", timestamp.year(), quarter)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses `time_text`, replaces the scraped `date` with the timestamp's own date
/// and derives the calendar features. Rows that fail to parse are reported in
/// [`TemporalResult::rejected_rows`] and left out of the returned frame.
pub fn normalize_timestamps(raw: &DataFrame) -> Result<TemporalResult, TemporalError> {
    let len = raw.height();

    let row_index = match raw.column(ROW_INDEX) {
        Ok(column) => Some(column.u32()?),
        Err(_) => None,
    };
    let scraped_dates = raw.column("date")?.str()?;
    let time_texts = raw.column("time_text")?.str()?;
    let titles = raw.column("title")?.str()?;
    let articles = raw.column("article")?.str()?;

    let mut row_indices: Vec<u32> = Vec::with_capacity(len);
    let mut dates: Vec<i32> = Vec::with_capacity(len);
    let mut timestamps: Vec<i64> = Vec::with_capacity(len);
    let mut out_titles: Vec<Option<&str>> = Vec::with_capacity(len);
    let mut raw_topics: Vec<Option<&str>> = Vec::with_capacity(len);
    let mut years: Vec<i32> = Vec::with_capacity(len);
    let mut months: Vec<i32> = Vec::with_capacity(len);
    let mut quarters: Vec<String> = Vec::with_capacity(len);
    let mut days: Vec<i32> = Vec::with_capacity(len);
    let mut weekdays: Vec<&'static str> = Vec::with_capacity(len);
    let mut timeslots: Vec<i32> = Vec::with_capacity(len);

    let mut rejected_rows = Vec::new();
    let mut date_overrides = Vec::new();

    for idx in 0..len {
        let input_row = row_index
            .and_then(|ca| ca.get(idx))
            .unwrap_or(idx as u32);
        let time_text = time_texts.get(idx).unwrap_or_default();
        let scraped = scraped_dates.get(idx).unwrap_or_default();

        let parsed = parse_broadcast_timestamp(time_text)
            .and_then(|ts| parse_scraped_date(scraped).map(|date| (ts, date)));

        let (timestamp, scraped_date) = match parsed {
            Ok(values) => values,
            Err(err) => {
                debug!(row = input_row, error = %err, "rejecting row with unparseable timestamp");
                rejected_rows.push(RejectedRow {
                    row_index: input_row,
                    time_text: time_text.to_string(),
                    date: scraped.to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let proof_date = timestamp.date();
        if proof_date != scraped_date {
            date_overrides.push(input_row);
        }

        row_indices.push(input_row);
        dates.push(proof_date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE);
        timestamps.push(timestamp.and_utc().timestamp_micros());
        out_titles.push(titles.get(idx));
        raw_topics.push(articles.get(idx));
        years.push(timestamp.year());
        months.push(timestamp.month() as i32);
        quarters.push(quarter_label(&timestamp));
        days.push(timestamp.day() as i32);
        weekdays.push(weekday_name(timestamp.weekday()));
        timeslots.push(timeslot(&timestamp));
    }

    let date_series = Series::new(DATE.into(), dates).cast(&DataType::Date)?;
    let timestamp_series = Series::new(TIMESTAMP.into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let dataframe = DataFrame::new(vec![
        Series::new(ROW_INDEX.into(), row_indices).into(),
        date_series.into(),
        timestamp_series.into(),
        Series::new(TITLE.into(), out_titles).into(),
        Series::new(RAW_TOPICS.into(), raw_topics).into(),
        Series::new(YEAR.into(), years).into(),
        Series::new(MONTH.into(), months).into(),
        Series::new(QUARTER.into(), quarters).into(),
        Series::new(DAY.into(), days).into(),
        Series::new(WEEKDAY_NAME.into(), weekdays).into(),
        Series::new(TIMESLOT.into(), timeslots).into(),
    ])?;

    if !rejected_rows.is_empty() {
        warn!(
            rejected = rejected_rows.len(),
            "excluded rows with malformed timestamp or date text"
        );
    }
    info!(
        rows_in = len,
        rows_out = dataframe.height(),
        date_overrides = date_overrides.len(),
        "normalized broadcast timestamps"
    );

    Ok(TemporalResult {
        dataframe,
        rejected_rows,
        date_overrides,
    })
}
