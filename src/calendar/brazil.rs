//! Brazilian national bank-holiday calendar.

use chrono::{Duration, NaiveDate};

use super::{HolidayCalendar, HolidayDate, HolidayKind};

const FIXED_HOLIDAYS: [(u32, u32, &str); 8] = [
    (1, 1, "New Year's Day"),
    (4, 21, "Tiradentes Day"),
    (5, 1, "Labour Day"),
    (9, 7, "Independence Day"),
    (10, 12, "Our Lady of Aparecida"),
    (11, 2, "All Souls' Day"),
    (11, 15, "Republic Day"),
    (12, 25, "Christmas"),
];

/// Offsets in days from Easter Sunday.
const MOVING_HOLIDAYS: [(i64, &str); 4] = [
    (-48, "Carnival Monday"),
    (-47, "Carnival Tuesday"),
    (-2, "Good Friday"),
    (60, "Corpus Christi"),
];

/// Brazil national calendar.
///
/// Weekends and the following holidays are observed:
/// * New Year's Day (Jan 1)
/// * Carnival Monday & Tuesday (Easter - 48, Easter - 47)
/// * Good Friday (Easter - 2)
/// * Tiradentes Day (Apr 21)
/// * Labour Day (May 1)
/// * Corpus Christi (Easter + 60)
/// * Independence Day (Sep 7)
/// * Our Lady of Aparecida (Oct 12)
/// * All Souls' Day (Nov 2)
/// * Republic Day (Nov 15)
/// * Christmas (Dec 25)
#[derive(Debug, Clone, Copy, Default)]
pub struct BrazilCalendar;

impl HolidayCalendar for BrazilCalendar {
    fn name(&self) -> &str {
        "Brazil (national)"
    }

    fn holidays_for_year(&self, year: i32) -> Vec<HolidayDate> {
        let mut holidays: Vec<HolidayDate> = FIXED_HOLIDAYS
            .iter()
            .filter_map(|&(month, day, name)| {
                NaiveDate::from_ymd_opt(year, month, day).map(|date| HolidayDate {
                    date,
                    name,
                    kind: HolidayKind::Fixed,
                })
            })
            .collect();

        if let Some(easter) = easter_sunday(year) {
            holidays.extend(MOVING_HOLIDAYS.iter().filter_map(|&(offset, name)| {
                easter
                    .checked_add_signed(Duration::days(offset))
                    .map(|date| HolidayDate {
                        date,
                        name,
                        kind: HolidayKind::Moving,
                    })
            }));
        }

        holidays.sort_by_key(|holiday| holiday.date);
        holidays
    }
}

/// Gregorian Easter Sunday for `year` (anonymous Gregorian algorithm).
///
/// Returns `None` only when the result is outside chrono's representable range.
/// No validation is applied to `year`; values before 1583 are computed with
/// Gregorian rules all the same.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b.div_euclid(4);
    let e = b.rem_euclid(4);
    let f = (b + 8).div_euclid(25);
    let g = (b - f + 1).div_euclid(3);
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let n = (h + l - 7 * m + 114) / 31;
    let p = (h + l - 7 * m + 114) % 31;
    NaiveDate::from_ymd_opt(year, n as u32, (p + 1) as u32)
}
