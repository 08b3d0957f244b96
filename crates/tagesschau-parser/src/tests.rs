use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Timelike};

use crate::errors::{ParserError, TimestampError};
use crate::formats::EpisodeCsvParser;
use crate::registry::EpisodeTableParser;
use crate::{parse_broadcast_timestamp, parse_episode_table, parse_scraped_date};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn parses_comma_separated_archive_export() {
    let content = fixture("episodes_small.csv");
    let parsed = parse_episode_table(&content).expect("episode table parse failed");

    assert_eq!(parsed.file_metadata.parser, "EPISODE_CSV");
    assert_eq!(parsed.file_metadata.row_count, 4);
    assert_eq!(
        parsed.df.get_column_names(),
        ["row_index", "date", "time_text", "title", "article"]
    );

    let article = parsed.df.column("article").unwrap().str().unwrap();
    assert_eq!(
        article.get(0),
        Some("Corona-Ausbruch in Gütersloh, Lufthansa-Rettung, Das Wetter")
    );
    assert_eq!(article.get(3), None, "blank article cells become null");

    let row_index = parsed.df.column("row_index").unwrap().u32().unwrap();
    assert_eq!(row_index.get(3), Some(3));
}

#[test]
fn falls_back_to_semicolon_layout() {
    let content = fixture("episodes_semicolon.csv");
    let parsed = parse_episode_table(&content).expect("semicolon parse failed");

    assert_eq!(parsed.file_metadata.parser, "EPISODE_CSV_SEMICOLON");
    assert_eq!(parsed.height(), 2);

    let time_text = parsed.df.column("time_text").unwrap().str().unwrap();
    assert_eq!(time_text.get(1), Some("01.02.2020 09:40 Uhr"));
    let article = parsed.df.column("article").unwrap().str().unwrap();
    assert_eq!(article.get(1), Some("-"), "placeholder survives the loader");
}

#[test]
fn missing_required_column_is_reported() {
    let content = fixture("missing_article.csv");
    let err = EpisodeCsvParser::COMMA
        .parse(&content)
        .expect_err("expected missing column");
    assert!(matches!(
        err,
        ParserError::MissingColumn {
            column: "article",
            ..
        }
    ));
}

#[test]
fn header_only_file_has_no_data() {
    let err = parse_episode_table("date,time_text,title,article\n").expect_err("expected error");
    assert!(matches!(err, ParserError::EmptyData { .. }));
}

#[test]
fn unrecognized_layout_lists_attempts() {
    let err = parse_episode_table("just one column\nvalue\n").expect_err("expected error");
    match err {
        ParserError::NoMatchingLayout { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].layout, "EPISODE_CSV");
            assert_eq!(attempts[1].delimiter, ';');
            assert!(attempts[0].reason.contains("just one column"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn short_header_reports_the_missing_column() {
    let content = "date,time_text,title
22/06/2020,23.06.2020 00:15 Uhr,tagesschau
";
    let err = parse_episode_table(content).expect_err("expected missing column");
    assert!(matches!(
        err,
        ParserError::MissingColumn {
            parser: "EPISODE_CSV",
            column: "article",
        }
    ));
}

#[test]
fn ragged_rows_fail_the_file() {
    let content = "date,time_text,title,article\n22/06/2020,23.06.2020 00:15 Uhr,tagesschau\n";
    let err = parse_episode_table(content).expect_err("expected csv error");
    assert!(matches!(err, ParserError::Csv { .. }));
}

#[test]
fn broadcast_timestamp_accepts_locale_suffix() {
    let ts = parse_broadcast_timestamp(" 23.06.2020 00:15 Uhr ").expect("parse");
    assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2020, 6, 23).unwrap());
    assert_eq!((ts.hour(), ts.minute()), (0, 15));

    let bare = parse_broadcast_timestamp("23.06.2020 14:37").expect("parse without suffix");
    assert_eq!((bare.hour(), bare.minute()), (14, 37));
}

#[test]
fn broadcast_timestamp_rejects_malformed_text() {
    assert_eq!(
        parse_broadcast_timestamp("   "),
        Err(TimestampError::Empty { field: "time_text" })
    );
    assert!(matches!(
        parse_broadcast_timestamp("2020-06-23 00:15"),
        Err(TimestampError::Invalid { .. })
    ));
    assert!(matches!(
        parse_broadcast_timestamp("23.06.2020 00:15 Uhr 2"),
        Err(TimestampError::TrailingText { .. })
    ));
}

#[test]
fn scraped_date_uses_day_month_year() {
    assert_eq!(
        parse_scraped_date("22/06/2020"),
        Ok(NaiveDate::from_ymd_opt(2020, 6, 22).unwrap())
    );
    assert!(parse_scraped_date("2020/06/22").is_err());
}
