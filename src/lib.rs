#![doc(test(attr(deny(warnings))))]

//! Cashflow Core computes Brazilian bank holidays, rolls due dates onto
//! business days, and expands recurring transactions into dated
//! installments for cash flow and budgeting dashboards.

pub mod boundary;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod recurrence;
pub mod service;
pub mod storage;
pub mod transaction;
pub mod utils;

pub use calendar::{AdjustDirection, BrazilCalendar, HolidayCalendar, HolidayDate, HolidayKind};
pub use errors::{RecurrenceError, Result};
pub use recurrence::{Frequency, RecurrenceExpander, RecurrenceRule};
pub use transaction::{AuditContext, Transaction, TransactionInstance, TransactionStatus};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Cashflow Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
