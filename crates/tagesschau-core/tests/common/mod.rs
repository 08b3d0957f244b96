#![allow(dead_code)]

use polars::prelude::*;
use tagesschau_parser::{parse_episode_table, ParsedEpisodeTable};

/// One scraped record: (date, time_text, title, article).
pub type RawRow<'a> = (&'a str, &'a str, &'a str, &'a str);

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn raw_csv(rows: &[RawRow<'_>]) -> String {
    let mut csv = String::from("date,time_text,title,article\n");
    for (date, time_text, title, article) in rows {
        let fields = [date, time_text, title, article].map(|f| quote(f));
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

pub fn raw_table(rows: &[RawRow<'_>]) -> ParsedEpisodeTable {
    parse_episode_table(&raw_csv(rows)).expect("parse raw rows")
}

pub fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .expect("column")
        .str()
        .expect("utf8 column")
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

pub fn dates(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    let as_text = df
        .column(column)
        .expect("column")
        .cast(&DataType::String)
        .expect("cast date");
    as_text
        .str()
        .expect("utf8 column")
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

pub fn u32s(df: &DataFrame, column: &str) -> Vec<Option<u32>> {
    df.column(column)
        .expect("column")
        .u32()
        .expect("u32 column")
        .into_iter()
        .collect()
}

pub fn i32s(df: &DataFrame, column: &str) -> Vec<Option<i32>> {
    df.column(column)
        .expect("column")
        .i32()
        .expect("i32 column")
        .into_iter()
        .collect()
}
