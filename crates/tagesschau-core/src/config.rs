use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CATEGORY_COUNT: usize = 7;
pub const CLASSIFIER_URL_ENV: &str = "TAGESSCHAU_CLASSIFIER_URL";
pub const DEFAULT_TOKEN_ENV: &str = "TAGESSCHAU_CLASSIFIER_TOKEN";

static DEFAULT_CATEGORIES: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "Politik",
        "Wirtschaft",
        "Sport",
        "Naturkatastrophe",
        "Kunst und Kultur",
        "Terrorismus",
        "Lottozahlen",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("expected {expected} categories, found {found}")]
    CategoryCount { expected: usize, found: usize },
    #[error("category label {0:?} is empty or padded with whitespace")]
    BlankCategory(String),
    #[error("category label '{0}' is listed more than once")]
    DuplicateCategory(String),
    #[error("category label '{label}' is '{first}' and '{second}' run together")]
    ConcatenatedCategory {
        label: String,
        first: String,
        second: String,
    },
    #[error("category label '{0}' looks like two labels glued together")]
    GluedCategory(String),
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
    #[error("quarantine weather pattern must not be blank")]
    BlankWeatherPattern,
    #[error("unknown output format '{0}' (expected parquet or csv)")]
    UnknownFormat(String),
}

/// The fixed label set handed to the classification service.
///
/// Construction validates the list: a fixed cardinality, no blank or repeated
/// labels, and no label that is two labels accidentally run together (for
/// instance `"Terrorismus" "Pandemie"` without a separating comma).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    pub fn new(labels: Vec<String>) -> Result<Self, ConfigError> {
        if labels.len() != CATEGORY_COUNT {
            return Err(ConfigError::CategoryCount {
                expected: CATEGORY_COUNT,
                found: labels.len(),
            });
        }

        for (idx, label) in labels.iter().enumerate() {
            if label.trim().is_empty() || label.trim() != label {
                return Err(ConfigError::BlankCategory(label.clone()));
            }
            let folded = label.to_lowercase();
            if labels[..idx].iter().any(|l| l.to_lowercase() == folded) {
                return Err(ConfigError::DuplicateCategory(label.clone()));
            }
            if has_glued_words(label) {
                return Err(ConfigError::GluedCategory(label.clone()));
            }
        }

        for (k, label) in labels.iter().enumerate() {
            for (i, first) in labels.iter().enumerate() {
                for (j, second) in labels.iter().enumerate() {
                    if i == j || i == k || j == k {
                        continue;
                    }
                    let glued = format!("{first}{second}");
                    let spaced = format!("{first} {second}");
                    if *label == glued || *label == spaced {
                        return Err(ConfigError::ConcatenatedCategory {
                            label: label.clone(),
                            first: first.clone(),
                            second: second.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CATEGORIES.clone(),
        }
    }
}

// A lowercase letter directly followed by an uppercase one never happens inside a
// single German category noun.
fn has_glued_words(label: &str) -> bool {
    let chars: Vec<char> = label.chars().collect();
    chars
        .windows(2)
        .any(|pair| pair[0].is_lowercase() && pair[1].is_uppercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    /// Case-folded topic texts occurring strictly more often than this are quarantined.
    pub threshold: usize,
    /// Case-insensitive substring marking a weather segment.
    pub weather_pattern: String,
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            weather_pattern: "das wetter".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: Option<String>,
    pub token_env: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub categories: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            concurrency: 8,
            timeout_secs: 30,
            categories: DEFAULT_CATEGORIES.clone(),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Bearer token for the service, read from the configured environment variable.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub quarantine: QuarantineConfig,
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(CLASSIFIER_URL_ENV) {
            if !url.trim().is_empty() {
                self.classifier.endpoint = Some(url);
            }
        }
        self
    }

    pub fn category_set(&self) -> Result<CategorySet, ConfigError> {
        CategorySet::new(self.classifier.categories.clone())
    }

    pub fn validate(&self) -> Result<CategorySet, ConfigError> {
        if self.classifier.concurrency == 0 {
            return Err(ConfigError::Zero {
                field: "classifier.concurrency",
            });
        }
        if self.classifier.timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "classifier.timeout_secs",
            });
        }
        if self.quarantine.weather_pattern.trim().is_empty() {
            return Err(ConfigError::BlankWeatherPattern);
        }
        self.category_set()
    }
}
