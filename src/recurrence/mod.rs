//! Recurrence rules and their expansion into transaction instances.

pub mod expander;
pub mod frequency;
pub mod rule;

pub use expander::{
    CatchUpReport, ExpanderSettings, RecurrenceExpander, ScheduledOccurrence,
    DEFAULT_SAFETY_CEILING,
};
pub use frequency::Frequency;
pub use rule::RecurrenceRule;
