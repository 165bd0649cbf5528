//! Materializes recurrence rules into dated transaction instances.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::rule::RecurrenceRule;
use crate::calendar::{adjust, AdjustDirection, HolidayCalendar};
use crate::errors::{RecurrenceError, Result};
use crate::transaction::{AuditContext, TransactionInstance};
use crate::utils::{Clock, SystemClock};

/// Instance count used when a rule carries neither `occurrences` nor `end_date`.
pub const DEFAULT_SAFETY_CEILING: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderSettings {
    pub safety_ceiling: u32,
    /// Optional cap on explicit `occurrences`; unset means any finite count is accepted.
    pub max_occurrences: Option<u32>,
    pub direction: AdjustDirection,
}

impl Default for ExpanderSettings {
    fn default() -> Self {
        Self {
            safety_ceiling: DEFAULT_SAFETY_CEILING,
            max_occurrences: None,
            direction: AdjustDirection::Forward,
        }
    }
}

/// One dated slot of a series, before any transaction is built for it.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledOccurrence {
    pub installment_number: u32,
    pub total_installments: u32,
    pub competencia_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Outcome of a catch-up run for a single rule.
#[derive(Debug, Clone)]
pub struct CatchUpReport {
    pub rule_id: Uuid,
    pub instances: Vec<TransactionInstance>,
    pub next_generation: Option<NaiveDate>,
    pub deactivated: bool,
}

pub struct RecurrenceExpander<C: HolidayCalendar> {
    calendar: C,
    settings: ExpanderSettings,
    clock: Box<dyn Clock>,
}

impl<C: HolidayCalendar> RecurrenceExpander<C> {
    pub fn new(calendar: C) -> Self {
        Self {
            calendar,
            settings: ExpanderSettings::default(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_settings(mut self, settings: ExpanderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn settings(&self) -> ExpanderSettings {
        self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn check(&self, rule: &RecurrenceRule) -> Result<u32> {
        rule.validate()?;
        if let (Some(count), Some(limit)) = (rule.occurrences, self.settings.max_occurrences) {
            if count > limit {
                return Err(RecurrenceError::Validation(format!(
                    "occurrences {} exceeds the limit of {}",
                    count, limit
                )));
            }
        }
        Ok(rule.resolved_max(self.settings.safety_ceiling))
    }

    fn slot(&self, rule: &RecurrenceRule, index: u32, total: u32) -> Option<ScheduledOccurrence> {
        let competencia_date = rule.occurrence_date(index)?;
        if !rule.allows(index, competencia_date, self.settings.safety_ceiling) {
            return None;
        }
        Some(ScheduledOccurrence {
            installment_number: index + 1,
            total_installments: total,
            competencia_date,
            due_date: adjust(&self.calendar, competencia_date, self.settings.direction),
        })
    }

    /// The full dated schedule of `rule`, from its first occurrence.
    pub fn schedule(&self, rule: &RecurrenceRule) -> Result<Vec<ScheduledOccurrence>> {
        let total = self.check(rule)?;
        Ok((0..total)
            .map_while(|index| self.slot(rule, index, total))
            .collect())
    }

    /// Scheduled slots whose competência date falls within `from..=to`.
    pub fn preview(
        &self,
        rule: &RecurrenceRule,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduledOccurrence>> {
        Ok(self
            .schedule(rule)?
            .into_iter()
            .skip_while(|slot| slot.competencia_date < from)
            .take_while(|slot| slot.competencia_date <= to)
            .collect())
    }

    /// Eagerly builds every instance of `rule`.
    pub fn expand(
        &self,
        rule: &RecurrenceRule,
        audit: &AuditContext,
    ) -> Result<Vec<TransactionInstance>> {
        let stamp = audit.stamp(self.clock.now());
        let instances: Vec<_> = self
            .schedule(rule)?
            .into_iter()
            .map(|slot| {
                rule.template.instantiate(
                    rule.id,
                    slot.competencia_date,
                    slot.due_date,
                    slot.installment_number,
                    slot.total_installments,
                    stamp.clone(),
                )
            })
            .collect();
        tracing::debug!(
            rule_id = %rule.id,
            frequency = %rule.frequency,
            generated = instances.len(),
            "expanded recurrence rule"
        );
        Ok(instances)
    }

    /// Materializes the occurrences of `rule` dated on or before `today` that
    /// earlier runs have not produced yet, advancing the rule's cursor.
    ///
    /// The rule is deactivated once its termination condition is reached.
    pub fn catch_up(
        &self,
        rule: &mut RecurrenceRule,
        today: NaiveDate,
        audit: &AuditContext,
    ) -> Result<CatchUpReport> {
        let total = self.check(rule)?;
        let mut report = CatchUpReport {
            rule_id: rule.id,
            instances: Vec::new(),
            next_generation: rule.next_generation,
            deactivated: false,
        };
        if !rule.active {
            return Ok(report);
        }

        let now = self.clock.now();
        let stamp = audit.stamp(now);
        let mut index = rule.resume_index(self.settings.safety_ceiling);
        let exhausted = loop {
            let Some(slot) = self.slot(rule, index, total) else {
                break true;
            };
            if slot.competencia_date > today {
                break false;
            }
            report.instances.push(rule.template.instantiate(
                rule.id,
                slot.competencia_date,
                slot.due_date,
                slot.installment_number,
                slot.total_installments,
                stamp.clone(),
            ));
            index += 1;
        };

        rule.generated_count = index;
        if !report.instances.is_empty() {
            rule.last_generated = Some(now);
        }
        if exhausted {
            rule.next_generation = None;
            rule.active = false;
            report.deactivated = true;
            tracing::info!(
                rule_id = %rule.id,
                generated = rule.generated_count,
                "recurrence rule reached its end and was deactivated"
            );
        } else {
            rule.next_generation = rule.occurrence_date(index);
        }
        report.next_generation = rule.next_generation;

        tracing::debug!(
            rule_id = %rule.id,
            generated = report.instances.len(),
            next = ?rule.next_generation,
            "catch-up generation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{BrazilCalendar, WeekendsOnly};
    use crate::recurrence::Frequency;
    use crate::transaction::{Transaction, TransactionStatus};
    use crate::utils::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expander() -> RecurrenceExpander<BrazilCalendar> {
        RecurrenceExpander::new(BrazilCalendar).with_clock(FixedClock::at_date(date(2025, 1, 1)))
    }

    fn monthly_rule(start: NaiveDate) -> RecurrenceRule {
        let template = Transaction::new("Office rent", 3200.0, start);
        RecurrenceRule::new(template, Frequency::Monthly, start)
    }

    #[test]
    fn open_ended_rule_stops_at_safety_ceiling() {
        let rule = monthly_rule(date(2025, 1, 15));
        let schedule = expander().schedule(&rule).unwrap();
        assert_eq!(schedule.len(), 12);
        assert!(schedule.iter().all(|slot| slot.total_installments == 12));
        assert_eq!(schedule[11].competencia_date, date(2025, 12, 15));
    }

    #[test]
    fn weekend_due_dates_roll_forward() {
        // 2025-03-15 is a Saturday.
        let rule = monthly_rule(date(2025, 2, 15)).with_occurrences(2);
        let schedule = RecurrenceExpander::new(WeekendsOnly).schedule(&rule).unwrap();
        assert_eq!(schedule[1].competencia_date, date(2025, 3, 15));
        assert_eq!(schedule[1].due_date, date(2025, 3, 17));
    }

    #[test]
    fn backward_direction_rolls_to_previous_business_day() {
        let rule = monthly_rule(date(2025, 3, 15)).with_occurrences(1);
        let settings = ExpanderSettings {
            direction: AdjustDirection::Backward,
            ..ExpanderSettings::default()
        };
        let schedule = RecurrenceExpander::new(WeekendsOnly)
            .with_settings(settings)
            .schedule(&rule)
            .unwrap();
        assert_eq!(schedule[0].due_date, date(2025, 3, 14));
    }

    #[test]
    fn occurrences_cap_is_opt_in() {
        let rule = monthly_rule(date(2025, 1, 1)).with_occurrences(1500);
        assert_eq!(expander().schedule(&rule).unwrap().len(), 1500);

        let capped = expander().with_settings(ExpanderSettings {
            max_occurrences: Some(1024),
            ..ExpanderSettings::default()
        });
        assert!(matches!(
            capped.schedule(&rule),
            Err(RecurrenceError::Validation(_))
        ));
    }

    #[test]
    fn expand_stamps_audit_and_series() {
        let mut rule = monthly_rule(date(2025, 1, 15)).with_occurrences(3);
        rule.template.status = TransactionStatus::Paid;
        let instances = expander()
            .expand(&rule, &AuditContext::new("ana"))
            .unwrap();
        assert_eq!(instances.len(), 3);
        for (idx, instance) in instances.iter().enumerate() {
            assert_eq!(instance.installment_number, Some(idx as u32 + 1));
            assert_eq!(instance.total_installments, Some(3));
            assert_eq!(instance.recurrence_id, Some(rule.id));
            assert_eq!(instance.status, TransactionStatus::Planned);
            assert_eq!(instance.audit.created_by.as_deref(), Some("ana"));
        }
    }

    #[test]
    fn preview_filters_by_window() {
        let rule = monthly_rule(date(2025, 1, 15));
        let preview = expander()
            .preview(&rule, date(2025, 4, 1), date(2025, 6, 30))
            .unwrap();
        let dates: Vec<_> = preview.iter().map(|slot| slot.competencia_date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 4, 15), date(2025, 5, 15), date(2025, 6, 15)]
        );
        assert_eq!(preview[0].installment_number, 4);
    }

    #[test]
    fn catch_up_generates_only_past_occurrences() {
        let mut rule = monthly_rule(date(2025, 1, 10)).with_occurrences(6);
        let audit = AuditContext::new("ops");
        let exp = expander();

        let first = exp.catch_up(&mut rule, date(2025, 3, 20), &audit).unwrap();
        assert_eq!(first.instances.len(), 3);
        assert_eq!(rule.generated_count, 3);
        assert_eq!(rule.next_generation, Some(date(2025, 4, 10)));
        assert!(rule.active);
        assert!(rule.last_generated.is_some());

        let again = exp.catch_up(&mut rule, date(2025, 3, 20), &audit).unwrap();
        assert!(again.instances.is_empty());

        let last = exp.catch_up(&mut rule, date(2025, 12, 31), &audit).unwrap();
        assert_eq!(last.instances.len(), 3);
        assert_eq!(last.instances[0].installment_number, Some(4));
        assert!(last.deactivated);
        assert!(!rule.active);
        assert_eq!(rule.next_generation, None);
    }

    #[test]
    fn inactive_rule_generates_nothing() {
        let mut rule = monthly_rule(date(2025, 1, 10));
        rule.active = false;
        let report = expander()
            .catch_up(&mut rule, date(2025, 12, 31), &AuditContext::new("ops"))
            .unwrap();
        assert!(report.instances.is_empty());
        assert!(!report.deactivated);
    }

    #[test]
    fn catch_up_honours_end_date() {
        let mut rule = monthly_rule(date(2025, 1, 10)).with_end_date(date(2025, 2, 28));
        let report = expander()
            .catch_up(&mut rule, date(2025, 6, 1), &AuditContext::new("ops"))
            .unwrap();
        assert_eq!(report.instances.len(), 2);
        assert!(report.deactivated);
    }
}
