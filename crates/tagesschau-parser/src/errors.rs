use std::fmt;

use thiserror::Error;

/// A delimiter layout that was tried on an input file and ruled out, with the
/// header evidence against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutAttempt {
    pub layout: &'static str,
    pub delimiter: char,
    pub reason: String,
}

impl fmt::Display for LayoutAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ('{}'): {}", self.layout, self.delimiter, self.reason)
    }
}

fn list_attempts(attempts: &[LayoutAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} does not split on '{delimiter}': {reason}")]
    LayoutMismatch {
        parser: &'static str,
        delimiter: char,
        reason: String,
    },

    #[error("{parser} header is missing required column '{column}'")]
    MissingColumn {
        parser: &'static str,
        column: &'static str,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} validation error: {message}")]
    Validation {
        parser: &'static str,
        message: String,
    },

    #[error("{parser} file did not contain any data rows")]
    EmptyData { parser: &'static str },

    #[error("episode header matched no delimiter layout: {}", list_attempts(.attempts))]
    NoMatchingLayout { attempts: Vec<LayoutAttempt> },
}

/// Problems with a single timestamp or date cell. These are row-level and the
/// caller decides whether to reject the row.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("empty {field}")]
    Empty { field: &'static str },

    #[error("invalid {field} '{value}': {message}")]
    Invalid {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("unexpected trailing text '{suffix}' after {field} '{value}'")]
    TrailingText {
        field: &'static str,
        value: String,
        suffix: String,
    },
}
