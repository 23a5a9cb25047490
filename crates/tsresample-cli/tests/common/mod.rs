#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2008, 6, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub fn stamp(offset: Duration) -> String {
    (base() + offset).format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn write_csv(dir: &Path, name: &str, contents: &str) -> TestResult<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Contiguous hourly intervals starting at `base()`, one row per value.
pub fn hourly_intervals(values: &[&str]) -> String {
    let mut out = String::from("start,end,value\n");
    for (i, v) in values.iter().enumerate() {
        let i = i as i64;
        out.push_str(&format!(
            "{},{},{v}\n",
            stamp(Duration::hours(i)),
            stamp(Duration::hours(i + 1))
        ));
    }
    out
}

/// Point samples every `every` starting at `base()`.
pub fn point_series(every: Duration, values: &[&str]) -> String {
    let mut out = String::from("time,value\n");
    for (i, v) in values.iter().enumerate() {
        out.push_str(&format!("{},{v}\n", stamp(every * i as i32)));
    }
    out
}
