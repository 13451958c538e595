use crate::buckets::{bucketize, table_rows};
use crate::models::{
    CategoryAverages, CategoryCounts, DaySplit, Event, Period, Report, Statistics, Window,
};
use crate::window::{filter_window, local_time, resolve_window};
use chrono::{DateTime, Datelike, TimeZone, Weekday};

/// Builds one render cycle: window, chart buckets, table rows and summary,
/// all from the same filtered view of `events`.
pub fn build_report<Tz: TimeZone>(events: &[Event], period: Period, now: &DateTime<Tz>) -> Report {
    let tz = now.timezone();
    let window = resolve_window(events, period, now);
    let in_window = filter_window(events, &window, &tz);
    let granularity = period.granularity();

    Report {
        period,
        granularity,
        granularity_label: granularity.label(),
        buckets: bucketize(&in_window, &window, granularity, &tz),
        table: table_rows(&in_window, &tz),
        statistics: summarize(&in_window, &window, &tz),
        window,
    }
}

/// Summary numbers for `events` over `window`. Pure: same inputs, same output.
pub fn summarize<Tz: TimeZone>(events: &[Event], window: &Window, tz: &Tz) -> Statistics {
    let mut totals = CategoryCounts::default();
    let mut weekday = DaySplit::default();
    let mut weekend = DaySplit::default();

    for event in events {
        if !totals.record(&event.category) {
            continue;
        }
        let split = if is_weekend(local_time(&event.timestamp, tz).weekday()) {
            &mut weekend
        } else {
            &mut weekday
        };
        split.counts.record(&event.category);
    }

    for date in window.dates() {
        if is_weekend(date.weekday()) {
            weekend.day_count += 1;
        } else {
            weekday.day_count += 1;
        }
    }

    for split in [&mut weekday, &mut weekend] {
        split.total = split.counts.total();
        split.average = round1(split.total as f64 / split.day_count.max(1) as f64);
    }

    let days = window.day_count();
    let per_day = |count: u64| {
        if days == 0 {
            0.0
        } else {
            round1(count as f64 / days as f64)
        }
    };

    Statistics {
        grand_total: totals.total(),
        per_day_average: CategoryAverages {
            beer: per_day(totals.beer),
            wine: per_day(totals.wine),
            liquor: per_day(totals.liquor),
            smoking: per_day(totals.smoking),
        },
        totals,
        days,
        weekday,
        weekend,
    }
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// One decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
