//! Shifting dates onto business days.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::HolidayCalendar;

/// No real calendar has a run of non-business days this long.
const MAX_ADJUST_STEPS: usize = 366;

/// Direction in which a non-business day is rolled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdjustDirection {
    /// Choose the first business day on or after the date.
    #[default]
    Forward,
    /// Choose the first business day on or before the date.
    Backward,
}

impl AdjustDirection {
    fn step(self) -> Duration {
        match self {
            AdjustDirection::Forward => Duration::days(1),
            AdjustDirection::Backward => Duration::days(-1),
        }
    }
}

/// Holiday set of a single year, re-derived when a walk crosses into another year.
struct YearHolidays<'a, C: HolidayCalendar + ?Sized> {
    calendar: &'a C,
    year: i32,
    dates: HashSet<NaiveDate>,
}

impl<'a, C: HolidayCalendar + ?Sized> YearHolidays<'a, C> {
    fn new(calendar: &'a C, year: i32) -> Self {
        Self {
            calendar,
            year,
            dates: calendar.holiday_set(year),
        }
    }

    fn is_business_day(&mut self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        if date.year() != self.year {
            self.year = date.year();
            self.dates = self.calendar.holiday_set(self.year);
        }
        !self.dates.contains(&date)
    }
}

/// Rolls `date` in `direction` until it lands on a business day.
pub fn adjust<C: HolidayCalendar + ?Sized>(
    calendar: &C,
    date: NaiveDate,
    direction: AdjustDirection,
) -> NaiveDate {
    let mut holidays = YearHolidays::new(calendar, date.year());
    let mut candidate = date;
    for _ in 0..MAX_ADJUST_STEPS {
        if holidays.is_business_day(candidate) {
            return candidate;
        }
        match candidate.checked_add_signed(direction.step()) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    tracing::warn!(
        calendar = calendar.name(),
        %date,
        "no business day found within {MAX_ADJUST_STEPS} days"
    );
    candidate
}

/// First business day on or after `date`.
pub fn adjust_forward<C: HolidayCalendar + ?Sized>(calendar: &C, date: NaiveDate) -> NaiveDate {
    adjust(calendar, date, AdjustDirection::Forward)
}

/// First business day on or before `date`.
pub fn adjust_backward<C: HolidayCalendar + ?Sized>(calendar: &C, date: NaiveDate) -> NaiveDate {
    adjust(calendar, date, AdjustDirection::Backward)
}

/// Moves `date` by `n` business days; negative values move backwards.
///
/// `date` itself does not need to be a business day.
pub fn advance_business_days<C: HolidayCalendar + ?Sized>(
    calendar: &C,
    date: NaiveDate,
    n: i32,
) -> NaiveDate {
    let direction = if n >= 0 {
        AdjustDirection::Forward
    } else {
        AdjustDirection::Backward
    };
    let mut holidays = YearHolidays::new(calendar, date.year());
    let mut current = date;
    let mut remaining = n.unsigned_abs();
    while remaining > 0 {
        current = match current.checked_add_signed(direction.step()) {
            Some(next) => next,
            None => break,
        };
        if holidays.is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Counts business days between `start` (exclusive) and `end` (inclusive).
///
/// Negative when `end` precedes `start`.
pub fn business_days_between<C: HolidayCalendar + ?Sized>(
    calendar: &C,
    start: NaiveDate,
    end: NaiveDate,
) -> i64 {
    if start == end {
        return 0;
    }
    let (sign, from, to) = if end > start {
        (1, start, end)
    } else {
        (-1, end, start)
    };
    let mut holidays = YearHolidays::new(calendar, from.year());
    let count = from
        .iter_days()
        .skip(1)
        .take_while(|day| *day <= to)
        .filter(|day| holidays.is_business_day(*day))
        .count() as i64;
    sign * count
}
