pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{LayoutAttempt, ParserError, TimestampError};
pub use formats::{parse_broadcast_timestamp, parse_scraped_date};
pub use model::{FileMetadata, ParsedEpisodeTable, RawColumn};
pub use registry::{parse_episode_table, parse_with_layouts, EpisodeTableParser};

#[cfg(test)]
mod tests;
