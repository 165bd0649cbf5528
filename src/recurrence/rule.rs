use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::frequency::Frequency;
use crate::boundary::iso_date;
use crate::errors::{RecurrenceError, Result};
use crate::transaction::Transaction;

/// Describes how a template transaction repeats.
///
/// Termination comes from `occurrences`, `end_date` (inclusive), or both; when
/// neither is set the expander's safety ceiling bounds the series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub frequency: Frequency,
    #[serde(default = "RecurrenceRule::default_interval")]
    pub interval: u32,
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub end_date: Option<NaiveDate>,
    pub template: Transaction,
    #[serde(default = "RecurrenceRule::default_active")]
    pub active: bool,
    /// First nominal date not yet materialized by catch-up generation.
    #[serde(default, with = "iso_date::option")]
    pub next_generation: Option<NaiveDate>,
    #[serde(default)]
    pub last_generated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generated_count: u32,
}

impl RecurrenceRule {
    pub fn new(template: Transaction, frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            frequency,
            interval: 1,
            start_date,
            occurrences: None,
            end_date: None,
            template,
            active: true,
            next_generation: Some(start_date),
            last_generated: None,
            generated_count: 0,
        }
    }

    pub fn with_occurrences(mut self, occurrences: u32) -> Self {
        self.occurrences = Some(occurrences);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(RecurrenceError::Validation(
                "recurrence interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Upper bound on the number of instances the series may produce.
    pub fn resolved_max(&self, safety_ceiling: u32) -> u32 {
        self.occurrences.unwrap_or(safety_ceiling)
    }

    /// Whether occurrence `index` (0-based) dated `date` is inside the series bounds.
    pub fn allows(&self, index: u32, date: NaiveDate, safety_ceiling: u32) -> bool {
        if index >= self.resolved_max(safety_ceiling) {
            return false;
        }
        match self.end_date {
            Some(end) => date <= end,
            None => true,
        }
    }

    /// Nominal date of occurrence `index`.
    pub fn occurrence_date(&self, index: u32) -> Option<NaiveDate> {
        self.frequency.nth(self.start_date, self.interval, index)
    }

    /// Index catch-up generation resumes from.
    ///
    /// Whichever of `generated_count` and `next_generation` is further along
    /// wins; hosts may send either one alone.
    pub fn resume_index(&self, safety_ceiling: u32) -> u32 {
        let Some(cursor) = self.next_generation else {
            return self.generated_count;
        };
        let limit = self.resolved_max(safety_ceiling);
        (self.generated_count..limit)
            .find(|&index| {
                self.occurrence_date(index)
                    .map_or(true, |nominal| nominal >= cursor)
            })
            .unwrap_or_else(|| limit.max(self.generated_count))
    }

    pub fn label(&self) -> String {
        self.frequency.label(self.interval)
    }

    pub fn default_interval() -> u32 {
        1
    }

    pub fn default_active() -> bool {
        true
    }
}
