#![allow(dead_code)]

use cashflow_core::{
    recurrence::{Frequency, RecurrenceRule},
    transaction::{Transaction, TransactionKind},
};
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}

/// A rule over a simple expense template dated at `start`.
pub fn rule(frequency: Frequency, start: NaiveDate) -> RecurrenceRule {
    let template = Transaction::new("Supplier invoice", 420.0, start).with_kind(TransactionKind::Expense);
    RecurrenceRule::new(template, frequency, start)
}
