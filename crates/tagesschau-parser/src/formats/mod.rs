mod common;
mod episode_csv;

pub use common::{parse_broadcast_timestamp, parse_scraped_date};
pub use episode_csv::EpisodeCsvParser;

pub(crate) use common::{build_raw_dataframe, RawColumns};
