mod common;

use polars::prelude::DataFrame;
use tagesschau_core::aggregate::{aggregate_episodes, is_placeholder, split_topics};
use tagesschau_core::dedup::deduplicate_episodes;
use tagesschau_core::temporal::normalize_timestamps;

use common::{raw_table, strings, u32s, RawRow};

fn aggregated(rows: &[RawRow<'_>]) -> (DataFrame, usize) {
    let temporal = normalize_timestamps(&raw_table(rows).df).expect("normalize");
    let deduped = deduplicate_episodes(&temporal.dataframe).expect("dedup");
    let result = aggregate_episodes(&deduped.dataframe).expect("aggregate");
    (result.dataframe, result.placeholder_descriptions)
}

#[test]
fn assigns_dense_ids_after_deduplication() {
    let (df, _) = aggregated(&[
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "Corona"),
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "Corona"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Lufthansa"),
        ("24/06/2020", "24.06.2020 20:00 Uhr", "Tagesschau", "Brexit"),
    ]);

    assert_eq!(u32s(&df, "episode_id"), vec![Some(0), Some(1), Some(2)]);
    assert!(df.column("row_index").is_err());
}

#[test]
fn counts_episodes_per_day() {
    let (df, _) = aggregated(&[
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "Corona"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Lufthansa"),
        ("24/06/2020", "24.06.2020 20:00 Uhr", "Tagesschau", "Brexit"),
    ]);

    assert_eq!(
        u32s(&df, "episodes_that_day"),
        vec![Some(2), Some(2), Some(1)]
    );
}

#[test]
fn normalizes_titles_and_counts_topics() {
    let (df, placeholders) = aggregated(&[(
        "23/06/2020",
        "23.06.2020 20:00 Uhr",
        "  Tagesschau 20 Uhr ",
        "Corona, Lufthansa,  Brexit",
    )]);

    assert_eq!(placeholders, 0);
    assert_eq!(
        strings(&df, "title"),
        vec![Some("tagesschau 20 uhr".to_string())]
    );
    assert_eq!(u32s(&df, "num_topics"), vec![Some(3)]);
    assert_eq!(u32s(&df, "description_length"), vec![Some(26)]);
}

#[test]
fn single_character_description_is_a_placeholder() {
    let (df, placeholders) = aggregated(&[
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "-"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Corona"),
    ]);

    assert_eq!(placeholders, 1);
    assert_eq!(
        strings(&df, "raw_topics"),
        vec![None, Some("Corona".to_string())]
    );
    assert_eq!(u32s(&df, "description_length"), vec![Some(0), Some(6)]);
    assert_eq!(u32s(&df, "num_topics"), vec![Some(0), Some(1)]);
}

#[test]
fn split_topics_keeps_parts_untrimmed() {
    assert_eq!(split_topics(Some("A, B,")), vec!["A", " B", ""]);
    assert!(split_topics(None).is_empty());
}

#[test]
fn single_letter_topic_list_is_kept() {
    let (df, placeholders) = aggregated(&[
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "B"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "-"),
    ]);

    assert_eq!(placeholders, 1);
    assert_eq!(strings(&df, "raw_topics"), vec![Some("B".to_string()), None]);
    assert_eq!(u32s(&df, "description_length"), vec![Some(1), Some(0)]);
    assert_eq!(u32s(&df, "num_topics"), vec![Some(1), Some(0)]);
}

#[test]
fn placeholder_is_a_lone_non_alphanumeric_character() {
    assert!(is_placeholder("-"));
    assert!(is_placeholder("."));
    assert!(!is_placeholder("B"));
    assert!(!is_placeholder("7"));
    assert!(!is_placeholder("--"));
    assert!(!is_placeholder(""));
}
