use crate::models::{Bucket, CategoryCounts, DayRow, Event, Granularity, Window};
use crate::window::local_time;
use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use std::collections::BTreeMap;

/// Splits `events` into one bucket per calendar unit covering `window`.
///
/// Buckets are chronological and gap-free; entries outside every bucket are
/// ignored, as are categories without a counter.
pub fn bucketize<Tz: TimeZone>(
    events: &[Event],
    window: &Window,
    granularity: Granularity,
    tz: &Tz,
) -> Vec<Bucket> {
    let (mut buckets, step) = match granularity {
        Granularity::Day => (day_buckets(window), 1),
        Granularity::Week => (week_buckets(window), 7),
    };

    let Some(origin) = buckets.first().map(|bucket| bucket.start) else {
        return buckets;
    };

    for event in events {
        let day = local_time(&event.timestamp, tz).date();
        let offset = (day - origin).num_days();
        if offset < 0 {
            continue;
        }
        if let Some(bucket) = buckets.get_mut((offset / step) as usize) {
            bucket.counts.record(&event.category);
        }
    }

    buckets
}

/// Per-day rows for the table view, newest day first. Days without a
/// counted entry are left out.
pub fn table_rows<Tz: TimeZone>(events: &[Event], tz: &Tz) -> Vec<DayRow> {
    let mut days: BTreeMap<NaiveDate, CategoryCounts> = BTreeMap::new();
    for event in events {
        let day = local_time(&event.timestamp, tz).date();
        let mut counts = days.get(&day).copied().unwrap_or_default();
        if counts.record(&event.category) {
            days.insert(day, counts);
        }
    }

    days.into_iter()
        .rev()
        .map(|(date, counts)| DayRow {
            label: short_date(date),
            total: counts.total(),
            date,
            counts,
        })
        .collect()
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

fn day_buckets(window: &Window) -> Vec<Bucket> {
    window
        .dates()
        .map(|date| Bucket {
            label: short_date(date),
            start: date,
            end: date,
            counts: CategoryCounts::default(),
        })
        .collect()
}

fn week_buckets(window: &Window) -> Vec<Bucket> {
    let last = window.end.date();
    let mut start = week_start(window.start.date());
    let mut buckets = Vec::new();
    while start <= last {
        buckets.push(Bucket {
            label: short_date(start),
            start,
            end: start + Duration::days(6),
            counts: CategoryCounts::default(),
        });
        start += Duration::days(7);
    }
    buckets
}
