//! Calendar windows for the dashboard and insights
//!
//! All boundaries are inclusive: a day runs from 00:00:00.000 to
//! 23:59:59.999 and a month from its first day's start to its last day's end.

use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Current local wall-clock time
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date) + Months::new(1) - Duration::days(1)
}

/// First day of the month `n` months before the month containing `date`
pub fn months_back(date: NaiveDate, n: u32) -> NaiveDate {
    first_of_month(date) - Months::new(n)
}

/// Inclusive window covering the calendar month of `now`
pub fn month_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let date = now.date();
    (
        start_of_day(first_of_month(date)),
        end_of_day(last_of_month(date)),
    )
}

/// Sunday that starts the week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Inclusive window covering the Sunday-to-Saturday week of `now`
pub fn week_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = start_of_week(now.date());
    (start_of_day(start), end_of_day(start + Duration::days(6)))
}

/// Inclusive window covering the calendar day of `now`
pub fn day_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let date = now.date();
    (start_of_day(date), end_of_day(date))
}

/// Whole days elapsed since the month of `now` began, at least 1
pub fn days_elapsed_in_month(now: NaiveDateTime) -> i64 {
    let (start, _) = month_window(now);
    (now - start).num_days().max(1)
}

/// Label such as "Mar 2024"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}
