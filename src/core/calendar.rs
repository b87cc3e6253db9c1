use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_business_day(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

/// Rolls a nominal due date forward onto the next business day. Stops at
/// the end of the representable calendar.
pub fn next_business_day(date: NaiveDate, holidays: &[NaiveDate]) -> NaiveDate {
    let mut current = date;
    while !is_business_day(current, holidays) {
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

pub fn previous_business_day(date: NaiveDate, holidays: &[NaiveDate]) -> NaiveDate {
    let mut current = date;
    while !is_business_day(current, holidays) {
        match current.pred_opt() {
            Some(previous) => current = previous,
            None => break,
        }
    }
    current
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Day-of-month clamped to the month length, so a 31st lands on the 28th/29th/30th.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn last_business_day(year: i32, month: u32, holidays: &[NaiveDate]) -> Option<NaiveDate> {
    clamped_date(year, month, 31).map(|last| previous_business_day(last, holidays))
}

pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    clamped_date(date.year(), date.month(), 31)
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Every (year, month) from `start`'s month through `end`'s month, inclusive.
pub fn months_spanning(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    let last = (end.year(), end.month());
    while (year, month) <= last {
        months.push((year, month));
        (year, month) = next_month(year, month);
    }
    months
}

pub fn first_weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let offset = (7 + weekday.num_days_from_monday() as i64
        - date.weekday().num_days_from_monday() as i64)
        % 7;
    date.checked_add_signed(Duration::days(offset))
}
