use crate::errors::{LayoutAttempt, ParserError};
use crate::formats::EpisodeCsvParser;
use crate::model::ParsedEpisodeTable;

pub trait EpisodeTableParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedEpisodeTable, ParserError>;
}

/// Reads an archive export, trying the comma layout before the semicolon one.
pub fn parse_episode_table(content: &str) -> Result<ParsedEpisodeTable, ParserError> {
    parse_with_layouts(
        content,
        &[&EpisodeCsvParser::COMMA, &EpisodeCsvParser::SEMICOLON],
    )
}

/// Uses the first layout whose delimiter splits the header. Once a layout
/// accepts the header, its errors (missing columns, ragged rows) are final.
pub fn parse_with_layouts(
    content: &str,
    layouts: &[&dyn EpisodeTableParser],
) -> Result<ParsedEpisodeTable, ParserError> {
    let mut ruled_out = Vec::with_capacity(layouts.len());
    for layout in layouts {
        match layout.parse(content) {
            Err(ParserError::LayoutMismatch {
                delimiter, reason, ..
            }) => ruled_out.push(LayoutAttempt {
                layout: layout.name(),
                delimiter,
                reason,
            }),
            outcome => return outcome,
        }
    }
    Err(ParserError::NoMatchingLayout {
        attempts: ruled_out,
    })
}
