//! Applies recurrence generation to the host's transaction collection.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::HolidayCalendar;
use crate::errors::{RecurrenceError, Result};
use crate::recurrence::{RecurrenceExpander, RecurrenceRule};
use crate::transaction::{AuditContext, Transaction};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The rules and transactions a host application keeps and persists together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashflowBook {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub rules: Vec<RecurrenceRule>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CashflowBook {
    fn default() -> Self {
        Self::new()
    }
}

impl CashflowBook {
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            rules: Vec::new(),
            transactions: Vec::new(),
            updated_at: None,
        }
    }

    pub fn rule(&self, id: Uuid) -> Option<&RecurrenceRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn rule_mut(&mut self, id: Uuid) -> Option<&mut RecurrenceRule> {
        self.rules.iter_mut().find(|rule| rule.id == id)
    }

    /// Instances generated for the given series, in installment order.
    pub fn series(&self, rule_id: Uuid) -> Vec<&Transaction> {
        let mut entries: Vec<_> = self
            .transactions
            .iter()
            .filter(|txn| txn.recurrence_id == Some(rule_id))
            .collect();
        entries.sort_by_key(|txn| (txn.installment_number, txn.competencia_date));
        entries
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Summary of one generation pass over a book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub created: usize,
    pub rules_processed: usize,
    pub rules_deactivated: Vec<Uuid>,
}

/// Stateless helpers for keeping recurrence rules and their instances in sync.
pub struct RecurrenceService;

impl RecurrenceService {
    /// Registers `rule` and eagerly materializes all of its instances.
    ///
    /// The rule is stored already exhausted: its cursor is cleared and it is
    /// inactive, so later catch-up passes do not duplicate instances.
    pub fn create_recurring<C: HolidayCalendar>(
        book: &mut CashflowBook,
        expander: &RecurrenceExpander<C>,
        mut rule: RecurrenceRule,
        audit: &AuditContext,
    ) -> Result<Vec<Uuid>> {
        if book.rule(rule.id).is_some() {
            return Err(RecurrenceError::Validation(format!(
                "recurrence rule {} already exists",
                rule.id
            )));
        }
        let instances = expander.expand(&rule, audit)?;
        let ids = instances.iter().map(|txn| txn.id).collect();

        rule.generated_count = instances.len() as u32;
        rule.next_generation = None;
        rule.active = false;
        if !instances.is_empty() {
            rule.last_generated = Some(expander.now());
        }
        tracing::info!(rule_id = %rule.id, created = instances.len(), "recurring series created");

        book.rules.push(rule);
        book.transactions.extend(instances);
        book.touch();
        Ok(ids)
    }

    /// Registers `rule` for incremental generation without materializing anything.
    pub fn schedule_recurring(book: &mut CashflowBook, mut rule: RecurrenceRule) -> Result<Uuid> {
        rule.validate()?;
        if book.rule(rule.id).is_some() {
            return Err(RecurrenceError::Validation(format!(
                "recurrence rule {} already exists",
                rule.id
            )));
        }
        if rule.next_generation.is_none() && rule.generated_count == 0 {
            rule.next_generation = Some(rule.start_date);
        }
        let id = rule.id;
        book.rules.push(rule);
        book.touch();
        Ok(id)
    }

    /// Runs catch-up generation for every active rule up to `today`.
    ///
    /// New instances are computed against copies of the rules and only
    /// written back once every rule succeeded, so a failing rule leaves the
    /// book untouched.
    pub fn generate_due<C: HolidayCalendar>(
        book: &mut CashflowBook,
        expander: &RecurrenceExpander<C>,
        today: NaiveDate,
        audit: &AuditContext,
    ) -> Result<GenerationSummary> {
        let mut rules = book.rules.clone();
        let mut created = Vec::new();
        let mut summary = GenerationSummary::default();

        for rule in rules.iter_mut().filter(|rule| rule.active) {
            let report = expander.catch_up(rule, today, audit)?;
            summary.rules_processed += 1;
            if report.deactivated {
                summary.rules_deactivated.push(report.rule_id);
            }
            created.extend(report.instances);
        }

        summary.created = created.len();
        book.rules = rules;
        if summary.created > 0 || !summary.rules_deactivated.is_empty() {
            book.transactions.extend(created);
            book.touch();
        }
        tracing::debug!(
            created = summary.created,
            processed = summary.rules_processed,
            %today,
            "due recurrences generated"
        );
        Ok(summary)
    }

    /// Pauses or resumes a rule.
    pub fn set_active(book: &mut CashflowBook, rule_id: Uuid, active: bool) -> Result<()> {
        let rule = book
            .rule_mut(rule_id)
            .ok_or(RecurrenceError::RuleNotFound(rule_id))?;
        if active && rule.next_generation.is_none() {
            return Err(RecurrenceError::Validation(format!(
                "recurrence rule {} has no occurrences left",
                rule_id
            )));
        }
        rule.active = active;
        book.touch();
        Ok(())
    }

    /// Removes a rule. With `drop_planned`, its still-planned instances go too;
    /// paid or confirmed ones always stay. Returns how many instances were removed.
    pub fn remove_rule(book: &mut CashflowBook, rule_id: Uuid, drop_planned: bool) -> Result<usize> {
        let position = book
            .rules
            .iter()
            .position(|rule| rule.id == rule_id)
            .ok_or(RecurrenceError::RuleNotFound(rule_id))?;
        book.rules.remove(position);

        let before = book.transactions.len();
        if drop_planned {
            book.transactions
                .retain(|txn| !(txn.recurrence_id == Some(rule_id) && txn.is_planned()));
        }
        let removed = before - book.transactions.len();
        book.touch();
        Ok(removed)
    }
}
