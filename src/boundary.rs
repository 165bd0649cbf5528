//! Exchange format with the host application.
//!
//! The host serializes dates as ISO-8601 date-time strings
//! (`2025-01-15T00:00:00.000Z`); everything inside the crate works on
//! `NaiveDate`. Rules arriving from the host carry their frequency as free
//! text and are validated here before any expansion happens.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::HolidayCalendar;
use crate::errors::{RecurrenceError, Result};
use crate::recurrence::{Frequency, RecurrenceExpander, RecurrenceRule};
use crate::transaction::{AuditContext, Transaction};

/// Parses the date part of an ISO-8601 value.
///
/// Accepts RFC 3339 date-times (the calendar date is taken as written, in the
/// string's own offset), date-times without offset, and plain `YYYY-MM-DD`.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(datetime.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RecurrenceError::InvalidDate(format!("`{}` is not an ISO-8601 date", raw)))
}

/// Formats `date` the way the host stores it: midnight UTC with milliseconds.
pub fn format_iso_date(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// Serde adapter for `NaiveDate` fields stored as ISO-8601 date-times.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso_date(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_str(&super::super::format_iso_date(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::super::parse_iso_date(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// A recurrence rule as the host submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub frequency: String,
    #[serde(default)]
    pub interval: Option<u32>,
    pub start_date: String,
    #[serde(default)]
    pub occurrences: Option<u32>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub template_transaction: Transaction,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub next_generation: Option<String>,
    #[serde(default)]
    pub last_generated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generated_count: Option<u32>,
}

impl TryFrom<RuleRecord> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        let frequency: Frequency = record.frequency.parse()?;
        let start_date = parse_iso_date(&record.start_date)?;
        let end_date = record.end_date.as_deref().map(parse_iso_date).transpose()?;
        let next_generation = match record.next_generation.as_deref() {
            Some(raw) => Some(parse_iso_date(raw)?),
            None => Some(start_date),
        };
        let rule = RecurrenceRule {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            frequency,
            interval: record.interval.unwrap_or_else(RecurrenceRule::default_interval),
            start_date,
            occurrences: record.occurrences,
            end_date,
            template: record.template_transaction,
            active: record.active.unwrap_or(true),
            next_generation,
            last_generated: record.last_generated,
            generated_count: record.generated_count.unwrap_or(0),
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Parses a host rule from JSON, validating it.
pub fn parse_rule(json: &str) -> Result<RecurrenceRule> {
    let record: RuleRecord = serde_json::from_str(json)?;
    RecurrenceRule::try_from(record)
}

/// Expands a host rule given as JSON, returning the instances as a JSON array.
pub fn expand_record<C: HolidayCalendar>(
    expander: &RecurrenceExpander<C>,
    json: &str,
    audit: &AuditContext,
) -> Result<String> {
    let rule = parse_rule(json)?;
    let instances = expander.expand(&rule, audit)?;
    Ok(serde_json::to_string(&instances)?)
}
