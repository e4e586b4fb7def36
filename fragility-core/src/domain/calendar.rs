//! Weekly Friday calendar.
//!
//! Every weekly table in the engine is labelled by the Friday that closes its
//! week: a Monday–Friday observation maps to that week's Friday, a weekend
//! observation maps to the following Friday.

use chrono::{Datelike, Duration, NaiveDate};

/// The Friday on or after `date`.
pub fn week_ending_friday(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_monday() as i64;
    let ahead = (4 - weekday).rem_euclid(7);
    date + Duration::days(ahead)
}

/// Every Friday from the week containing `start` through the week containing `end`.
pub fn weekly_fridays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let first = week_ending_friday(start);
    let last = week_ending_friday(end);
    let mut out = Vec::new();
    let mut current = first;
    while current <= last {
        out.push(current);
        current += Duration::days(7);
    }
    out
}
