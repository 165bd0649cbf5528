use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::RecurrenceError;

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Three calendar months.
    Quarterly,
    /// Six calendar months.
    Semiannual,
    Annual,
}

enum Step {
    Days(i64),
    Months(u32),
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Semiannual,
        Frequency::Annual,
    ];

    fn unit(self) -> Step {
        match self {
            Frequency::Daily => Step::Days(1),
            Frequency::Weekly => Step::Days(7),
            Frequency::Monthly => Step::Months(1),
            Frequency::Quarterly => Step::Months(3),
            Frequency::Semiannual => Step::Months(6),
            Frequency::Annual => Step::Months(12),
        }
    }

    /// Date of occurrence `index` (0-based) of a series anchored at `start`.
    ///
    /// Month-based steps are measured from the anchor and use chrono's
    /// `checked_add_months`, which clamps to the last day of shorter months:
    /// a series starting Jan 31 yields Feb 28 (or 29), then Mar 31.
    /// Returns `None` when the date leaves chrono's supported range.
    pub fn nth(self, start: NaiveDate, interval: u32, index: u32) -> Option<NaiveDate> {
        let steps = u64::from(interval) * u64::from(index);
        match self.unit() {
            Step::Days(days) => {
                let total = i64::try_from(steps).ok()?.checked_mul(days)?;
                start.checked_add_signed(Duration::try_days(total)?)
            }
            Step::Months(months) => {
                let total = u32::try_from(steps.checked_mul(u64::from(months))?).ok()?;
                start.checked_add_months(Months::new(total))
            }
        }
    }

    /// The date one step of `interval` units after `from`.
    pub fn advance(self, from: NaiveDate, interval: u32) -> Option<NaiveDate> {
        self.nth(from, interval, 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
        }
    }

    /// User-facing cadence label, e.g. `Monthly` or `Every 2 weeks`.
    pub fn label(self, interval: u32) -> String {
        if interval == 1 {
            let label = match self {
                Frequency::Daily => "Daily",
                Frequency::Weekly => "Weekly",
                Frequency::Monthly => "Monthly",
                Frequency::Quarterly => "Quarterly",
                Frequency::Semiannual => "Semiannual",
                Frequency::Annual => "Annual",
            };
            return label.into();
        }
        let unit = match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Quarterly => "quarter",
            Frequency::Semiannual => "half-year",
            Frequency::Annual => "year",
        };
        format!("Every {} {}s", interval, unit)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RecurrenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Frequency::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == normalized)
            .ok_or_else(|| {
                RecurrenceError::Validation(format!("unrecognized frequency `{}`", value))
            })
    }
}
