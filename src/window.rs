use crate::models::{Event, Period, Window};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

pub fn local_time<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    at.with_timezone(tz).naive_local()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Computes the reporting interval for `period`.
///
/// With history the window opens at the midnight of the earliest entry and
/// runs `period` calendar days, clipped to the end of today. Without history
/// it trails `now` by `period` days.
pub fn resolve_window<Tz: TimeZone>(events: &[Event], period: Period, now: &DateTime<Tz>) -> Window {
    let tz = now.timezone();
    let now_local = now.naive_local();
    let today_end = end_of_day(now_local.date());

    let earliest = events
        .iter()
        .map(|event| local_time(&event.timestamp, &tz))
        .min();

    match earliest {
        None => Window {
            start: now_local - Duration::days(period.days()),
            end: today_end,
        },
        Some(first) => {
            let start = start_of_day(first.date());
            let candidate_end = end_of_day(start.date() + Duration::days(period.days() - 1));
            let mut end = candidate_end.min(today_end);
            if end < start {
                // entries stamped after `now` (clock skew) still get their own day
                end = end_of_day(start.date());
            }
            Window { start, end }
        }
    }
}

/// Entries whose local timestamp falls inside `window`, in input order.
pub fn filter_window<Tz: TimeZone>(events: &[Event], window: &Window, tz: &Tz) -> Vec<Event> {
    events
        .iter()
        .filter(|event| window.contains(local_time(&event.timestamp, tz)))
        .cloned()
        .collect()
}
