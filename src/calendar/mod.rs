//! Holiday calendars and business-day arithmetic.
//!
//! A calendar knows which dates of a given year are holidays; weekends are
//! Saturday and Sunday for every calendar in this crate.

pub mod brazil;
pub mod business_day;

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub use brazil::{easter_sunday, BrazilCalendar};
pub use business_day::{
    adjust, adjust_backward, adjust_forward, advance_business_days, business_days_between,
    AdjustDirection,
};

/// Whether a holiday falls on the same calendar date every year or moves with Easter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HolidayKind {
    Fixed,
    Moving,
}

/// A single named holiday occurrence.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct HolidayDate {
    pub date: NaiveDate,
    pub name: &'static str,
    pub kind: HolidayKind,
}

impl fmt::Display for HolidayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.date.format("%Y-%m-%d"))
    }
}

/// Source of non-working dates.
///
/// Implementors only list holidays; weekend handling and business-day checks
/// are provided.
pub trait HolidayCalendar: Send + Sync {
    /// Human-readable calendar name.
    fn name(&self) -> &str;

    /// Every holiday observed in `year`, sorted by date.
    fn holidays_for_year(&self, year: i32) -> Vec<HolidayDate>;

    /// Distinct holiday dates for `year`.
    fn holiday_set(&self, year: i32) -> HashSet<NaiveDate> {
        self.holidays_for_year(year)
            .into_iter()
            .map(|holiday| holiday.date)
            .collect()
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays_for_year(date.year())
            .iter()
            .any(|holiday| holiday.date == date)
    }

    fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend(date) && !self.is_holiday(date)
    }
}

impl<C: HolidayCalendar + ?Sized> HolidayCalendar for &C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn holidays_for_year(&self, year: i32) -> Vec<HolidayDate> {
        (**self).holidays_for_year(year)
    }
}

impl<C: HolidayCalendar + ?Sized> HolidayCalendar for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn holidays_for_year(&self, year: i32) -> Vec<HolidayDate> {
        (**self).holidays_for_year(year)
    }
}

/// Calendar with no holidays; only weekends are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendsOnly;

impl HolidayCalendar for WeekendsOnly {
    fn name(&self) -> &str {
        "Weekends only"
    }

    fn holidays_for_year(&self, _year: i32) -> Vec<HolidayDate> {
        Vec::new()
    }
}

/// Resolves a calendar by its configuration name.
pub fn calendar_by_name(name: &str) -> Option<Box<dyn HolidayCalendar>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "brazil" | "br" => Some(Box::new(BrazilCalendar)),
        "weekends" | "weekends-only" | "none" => Some(Box::new(WeekendsOnly)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekends_are_not_business_days() {
        let cal = WeekendsOnly;
        // 2025-06-14 is a Saturday
        assert!(!cal.is_business_day(date(2025, 6, 14)));
        assert!(!cal.is_business_day(date(2025, 6, 15)));
        assert!(cal.is_business_day(date(2025, 6, 16)));
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(calendar_by_name("Brazil").unwrap().name(), "Brazil (national)");
        assert_eq!(calendar_by_name("none").unwrap().name(), "Weekends only");
        assert!(calendar_by_name("atlantis").is_none());
    }

    #[test]
    fn boxed_calendar_delegates() {
        let boxed: Box<dyn HolidayCalendar> = Box::new(BrazilCalendar);
        assert!(boxed.is_holiday(date(2025, 12, 25)));
        assert!(!boxed.is_business_day(date(2025, 12, 25)));
    }

    #[test]
    fn holiday_display() {
        let holiday = HolidayDate {
            date: date(2025, 9, 7),
            name: "Independence Day",
            kind: HolidayKind::Fixed,
        };
        assert_eq!(holiday.to_string(), "Independence Day (2025-09-07)");
    }
}
