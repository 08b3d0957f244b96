mod common;

use polars::prelude::DataFrame;
use tagesschau_core::aggregate::aggregate_episodes;
use tagesschau_core::temporal::normalize_timestamps;
use tagesschau_core::unstack::unstack_topics;

use common::{raw_table, strings, u32s, RawRow};

fn episodes(rows: &[RawRow<'_>]) -> DataFrame {
    let temporal = normalize_timestamps(&raw_table(rows).df).expect("normalize");
    aggregate_episodes(&temporal.dataframe)
        .expect("aggregate")
        .dataframe
}

#[test]
fn fans_out_one_row_per_topic() {
    let episodes = episodes(&[
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", "Corona, Lufthansa, Brexit"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesthemen", "Hongkong"),
    ]);

    let result = unstack_topics(&episodes).expect("unstack");
    let df = &result.dataframe;

    assert_eq!(df.height(), 4);
    assert_eq!(
        u32s(df, "episode_id"),
        vec![Some(0), Some(0), Some(0), Some(1)]
    );
    assert_eq!(
        strings(df, "topic_text"),
        vec![
            Some("Corona".to_string()),
            Some("Lufthansa".to_string()),
            Some("Brexit".to_string()),
            Some("Hongkong".to_string()),
        ]
    );
    assert_eq!(
        strings(df, "title"),
        vec![
            Some("tagesschau".to_string()),
            Some("tagesschau".to_string()),
            Some("tagesschau".to_string()),
            Some("tagesthemen".to_string()),
        ]
    );
    assert!(df.column("raw_topics").is_err());
}

#[test]
fn episodes_without_topics_produce_no_rows() {
    let episodes = episodes(&[
        ("23/06/2020", "23.06.2020 17:00 Uhr", "Tagesschau", ""),
        ("23/06/2020", "23.06.2020 17:30 Uhr", "Tagesschau", "-"),
        ("23/06/2020", "23.06.2020 20:00 Uhr", "Tagesschau", "Corona"),
    ]);

    let result = unstack_topics(&episodes).expect("unstack");

    assert_eq!(result.episodes_without_topics, 2);
    assert_eq!(u32s(&result.dataframe, "episode_id"), vec![Some(2)]);
}

#[test]
fn blank_parts_are_dropped_and_text_trimmed() {
    let episodes = episodes(&[(
        "23/06/2020",
        "23.06.2020 20:00 Uhr",
        "Tagesschau",
        "  Corona  ,, ,Lufthansa,",
    )]);

    let result = unstack_topics(&episodes).expect("unstack");

    assert_eq!(result.blank_topics_dropped, 3);
    assert_eq!(
        strings(&result.dataframe, "topic_text"),
        vec![Some("Corona".to_string()), Some("Lufthansa".to_string())]
    );
}
