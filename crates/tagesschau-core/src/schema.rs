//! Column names shared by the pipeline stages and the persisted tables.

pub const ROW_INDEX: &str = "row_index";
pub const EPISODE_ID: &str = "episode_id";
pub const DATE: &str = "date";
pub const TIMESTAMP: &str = "timestamp";
pub const TITLE: &str = "title";
pub const RAW_TOPICS: &str = "raw_topics";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const QUARTER: &str = "quarter";
pub const DAY: &str = "day";
pub const WEEKDAY_NAME: &str = "weekday_name";
pub const TIMESLOT: &str = "timeslot";
pub const DESCRIPTION_LENGTH: &str = "description_length";
pub const EPISODES_THAT_DAY: &str = "episodes_that_day";
pub const NUM_TOPICS: &str = "num_topics";
pub const TOPIC_TEXT: &str = "topic_text";
pub const CATEGORY: &str = "category";

/// Columns of the persisted episode-level table, in order.
pub const EPISODE_COLUMNS: [&str; 13] = [
    EPISODE_ID,
    DATE,
    TIMESTAMP,
    TITLE,
    YEAR,
    MONTH,
    QUARTER,
    DAY,
    WEEKDAY_NAME,
    TIMESLOT,
    DESCRIPTION_LENGTH,
    EPISODES_THAT_DAY,
    NUM_TOPICS,
];

/// Columns of the persisted topic-level and quarantine tables, in order.
pub const TOPIC_COLUMNS: [&str; 15] = [
    EPISODE_ID,
    DATE,
    TIMESTAMP,
    TITLE,
    YEAR,
    MONTH,
    QUARTER,
    DAY,
    WEEKDAY_NAME,
    TIMESLOT,
    DESCRIPTION_LENGTH,
    EPISODES_THAT_DAY,
    NUM_TOPICS,
    TOPIC_TEXT,
    CATEGORY,
];
