mod common;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tagesschau_core::classifier::{ClassifierError, LabelScore, ZeroShotClassifier};
use tagesschau_core::config::PipelineConfig;
use tagesschau_core::error::PipelineError;
use tagesschau_core::pipeline::{AbortSignal, EpisodePipeline};
use tagesschau_core::summary::ClassificationStatus;

use common::{raw_table, strings, u32s, RawRow};

const SCENARIO: [RawRow<'static>; 3] = [
    ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "A,B"),
    ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "A,B"),
    ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "B"),
];

/// Always answers with the first label, except for texts listed as failing.
struct FirstLabel {
    failing: Vec<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FirstLabel {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for FirstLabel {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(text.to_string())
            .or_insert(0) += 1;
        if self.failing.iter().any(|f| f == text) {
            return Err(ClassifierError::InvalidInput(format!("rejected '{text}'")));
        }
        Ok(labels
            .iter()
            .enumerate()
            .map(|(idx, label)| LabelScore::new(label.clone(), 1.0 / (idx as f64 + 1.0)))
            .collect())
    }
}

fn pipeline() -> EpisodePipeline {
    EpisodePipeline::new(PipelineConfig::default()).expect("default config is valid")
}

#[test]
fn three_record_scenario_before_classification() {
    let table = raw_table(&SCENARIO);

    let output = pipeline()
        .prepare(&table, None, &AbortSignal::never())
        .expect("prepare");

    assert_eq!(output.episodes.height(), 2);
    assert_eq!(output.topics.height(), 3);
    assert_eq!(output.quarantined.height(), 0);
    assert_eq!(
        strings(&output.topics, "topic_text"),
        vec![Some("A".to_string()), Some("B".to_string()), Some("B".to_string())]
    );
    assert_eq!(u32s(&output.topics, "episode_id"), vec![Some(0), Some(0), Some(1)]);
    assert_eq!(u32s(&output.episodes, "num_topics"), vec![Some(2), Some(1)]);
    assert_eq!(u32s(&output.episodes, "episodes_that_day"), vec![Some(2), Some(2)]);
    assert_eq!(output.summary.episodes.duplicates_removed, 1);
    assert_eq!(output.summary.topics.surviving, 3);
}

#[tokio::test]
async fn full_run_classifies_and_isolates_failures() {
    let table = raw_table(&SCENARIO);
    let classifier = FirstLabel::new(&["A"]);

    let output = pipeline()
        .run(
            &table,
            Some("scenario.csv".to_string()),
            Some(&classifier as &dyn ZeroShotClassifier),
            &AbortSignal::never(),
        )
        .await
        .expect("run");

    assert_eq!(
        strings(&output.topics, "category"),
        vec![None, Some("Politik".to_string()), Some("Politik".to_string())]
    );
    let summary = &output.summary;
    assert_eq!(summary.input.path.as_deref(), Some("scenario.csv"));
    assert_eq!(summary.input.raw_rows, 3);
    assert_eq!(summary.classification.status, ClassificationStatus::Completed);
    assert_eq!(summary.classification.distinct_texts, 2);
    assert_eq!(summary.classification.classified_rows, 2);
    assert_eq!(summary.classification.failed_texts, 1);
    assert_eq!(summary.classification.failed_rows, 1);
    let politik = summary
        .classification
        .category_counts
        .iter()
        .find(|c| c.category == "Politik")
        .expect("politik count");
    assert_eq!(politik.rows, 2);
    assert_eq!(summary.classification.category_counts.len(), 7);
    assert_eq!(classifier.calls.lock().expect("calls lock").get("B"), Some(&1));
}

#[tokio::test]
async fn skipped_classification_leaves_categories_null() {
    let table = raw_table(&SCENARIO);

    let output = pipeline()
        .run(&table, None, None, &AbortSignal::never())
        .await
        .expect("run");

    assert!(strings(&output.topics, "category").iter().all(Option::is_none));
    assert_eq!(output.summary.classification.status, ClassificationStatus::Skipped);
}

#[tokio::test]
async fn raised_abort_stops_before_first_stage() {
    let table = raw_table(&SCENARIO);
    let (sender, abort) = AbortSignal::new();
    sender.send(true).expect("signal receiver alive");

    let err = pipeline()
        .run(&table, None, None, &abort)
        .await
        .expect_err("aborted");

    assert!(matches!(err, PipelineError::Aborted(_)));
}

#[test]
fn weather_only_episode_keeps_zero_topics() {
    let table = raw_table(&[
        ("23/06/2020", "23.06.2020 19:50 Uhr", "Tagesschau", "Das Wetter"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Corona, das Wetter"),
    ]);

    let output = pipeline()
        .prepare(&table, None, &AbortSignal::never())
        .expect("prepare");

    assert_eq!(u32s(&output.episodes, "num_topics"), vec![Some(0), Some(1)]);
    assert_eq!(output.quarantined.height(), 2);
    assert_eq!(output.summary.topics.quarantined_weather, 2);
    assert_eq!(output.summary.episodes.episodes_emptied_by_quarantine, 1);
}

#[test]
fn check_stage_reports_rejections() {
    let table = raw_table(&[
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Corona"),
        ("23/06/2020", "kaputt", "Tagesschau", "Corona"),
    ]);

    let stage = pipeline().episodes(&table, None).expect("episodes");

    assert_eq!(stage.episodes.height(), 1);
    assert_eq!(stage.summary.temporal.rejected_rows, 1);
    assert_eq!(stage.summary.temporal.rejected_samples[0].time_text, "kaputt");
}

#[test]
fn blank_only_topic_list_is_not_counted_as_quarantined() {
    let table = raw_table(&[
        ("23/06/2020", "23.06.2020 19:50 Uhr", "Tagesschau", " , "),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Corona"),
    ]);

    let output = pipeline()
        .prepare(&table, None, &AbortSignal::never())
        .expect("prepare");

    assert_eq!(u32s(&output.episodes, "num_topics"), vec![Some(0), Some(1)]);
    assert_eq!(output.quarantined.height(), 0);
    assert_eq!(output.summary.topics.blank_dropped, 2);
    assert_eq!(output.summary.episodes.episodes_emptied_by_quarantine, 0);
}

#[test]
fn duplicate_rows_count_one_date_override() {
    let table = raw_table(&[
        ("22/06/2020", "23.06.2020 00:15 Uhr", "Tagesschau", "Corona"),
        ("22/06/2020", "23.06.2020 00:15 Uhr", "Tagesschau", "Corona"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Brexit"),
    ]);

    let stage = pipeline().episodes(&table, None).expect("episodes");

    assert_eq!(stage.summary.episodes.duplicates_removed, 1);
    assert_eq!(stage.summary.temporal.date_overrides, 1);
}
