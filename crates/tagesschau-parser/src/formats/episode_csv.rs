use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};

use crate::errors::ParserError;
use crate::model::{FileMetadata, ParsedEpisodeTable, RawColumn};
use crate::registry::EpisodeTableParser;

use super::common::clean_optional;
use super::{build_raw_dataframe, RawColumns};

/// Delimited text export of the scraped archive. The same layout shows up both
/// comma separated and, when round-tripped through a German spreadsheet,
/// semicolon separated.
pub struct EpisodeCsvParser {
    name: &'static str,
    delimiter: u8,
}

impl EpisodeCsvParser {
    pub const COMMA: EpisodeCsvParser = EpisodeCsvParser {
        name: "EPISODE_CSV",
        delimiter: b',',
    };

    pub const SEMICOLON: EpisodeCsvParser = EpisodeCsvParser {
        name: "EPISODE_CSV_SEMICOLON",
        delimiter: b';',
    };

    fn map_header(&self, header: &StringRecord) -> Result<HashMap<RawColumn, usize>, ParserError> {
        // A header that stays in one piece was written with another delimiter.
        if header.len() < 2 {
            return Err(ParserError::LayoutMismatch {
                parser: self.name,
                delimiter: char::from(self.delimiter),
                reason: format!(
                    "header '{}' is a single field",
                    header.get(0).unwrap_or_default()
                ),
            });
        }

        let mut positions = HashMap::new();
        for (idx, field) in header.iter().enumerate() {
            if let Ok(column) = RawColumn::try_from(field.trim_start_matches('\u{feff}')) {
                positions.entry(column).or_insert(idx);
            }
        }

        for column in RawColumn::ALL {
            if !positions.contains_key(&column) {
                return Err(ParserError::MissingColumn {
                    parser: self.name,
                    column: column.as_str(),
                });
            }
        }

        Ok(positions)
    }
}

impl EpisodeTableParser for EpisodeCsvParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn parse(&self, content: &str) -> Result<ParsedEpisodeTable, ParserError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(content.as_bytes());

        let header = reader
            .headers()
            .map_err(|source| ParserError::Csv {
                parser: self.name,
                source,
            })?
            .clone();
        let positions = self.map_header(&header)?;

        let mut columns = RawColumns::with_capacity(content.lines().count());
        for record in reader.records() {
            let record = record.map_err(|source| ParserError::Csv {
                parser: self.name,
                source,
            })?;
            let field = |column: RawColumn| record.get(positions[&column]);

            columns
                .date
                .push(field(RawColumn::Date).unwrap_or_default().to_string());
            columns
                .time_text
                .push(field(RawColumn::TimeText).unwrap_or_default().to_string());
            columns
                .title
                .push(field(RawColumn::Title).unwrap_or_default().to_string());
            columns.article.push(clean_optional(field(RawColumn::Article)));
        }

        if columns.is_empty() {
            return Err(ParserError::EmptyData { parser: self.name });
        }

        let row_count = columns.len();
        let df = build_raw_dataframe(self.name, columns)?;

        Ok(ParsedEpisodeTable {
            file_metadata: FileMetadata {
                parser: self.name.to_string(),
                row_count,
                columns: header.iter().map(|h| h.trim().to_string()).collect(),
                content_hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
            },
            df,
        })
    }
}
