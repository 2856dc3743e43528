use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{AggregatedRelease, ReleaseTableRow};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Title key used to detect the same release listed more than once.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Parses a release date of year, month or day precision into epoch millis
/// at UTC midnight of its first day.
pub fn release_timestamp(release_date: &str) -> Option<i64> {
    let date = release_date.trim();
    let parsed = match date.len() {
        4 => NaiveDate::parse_from_str(&format!("{date}-01-01"), "%Y-%m-%d"),
        7 => NaiveDate::parse_from_str(&format!("{date}-01"), "%Y-%m-%d"),
        _ => NaiveDate::parse_from_str(date, "%Y-%m-%d"),
    }
    .ok()?;

    Some(parsed.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

pub fn lookback_cutoff(now_millis: i64, lookback_days: u32) -> i64 {
    now_millis - i64::from(lookback_days) * MILLIS_PER_DAY
}

pub fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown".to_string(),
    }
}

pub fn to_release_table_rows(releases: &[AggregatedRelease]) -> Vec<ReleaseTableRow> {
    releases
        .iter()
        .map(|r| ReleaseTableRow {
            date: r.album.release_date.clone(),
            name: r.album.name.clone(),
            kind: r.album.album_type.clone(),
            artist: r.artist.name.clone(),
            with: r
                .collaboration_info
                .as_ref()
                .map(|c| c.collaborating_artists.join(", "))
                .unwrap_or_default(),
        })
        .collect()
}

pub fn sort_release_table_rows(rows: &mut [ReleaseTableRow]) {
    rows.sort_by(|a, b| {
        match b.date.cmp(&a.date) {
            Ordering::Equal => a.artist.cmp(&b.artist), // secondary sort: artist ascending
            other => other,
        }
    });
}
