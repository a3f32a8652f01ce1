//! Recurrence error types

use thiserror::Error;

/// Errors raised while composing a recurring event
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecurrenceError {
    /// Weekly, biweekly and custom patterns need at least one day
    #[error("Select at least one day of the week")]
    NoDaysSelected,

    /// Custom patterns need a positive interval
    #[error("Interval must be at least 1")]
    InvalidInterval,

    /// Monthly by-weekday needs both halves
    #[error("Monthly patterns need both a week position and a weekday")]
    IncompleteMonthlyWeekday,

    /// Count end condition needs a positive count
    #[error("Occurrence count must be at least 1")]
    InvalidCount,

    /// Date end condition lies before the series start
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Occurrences need a positive duration
    #[error("Duration must be positive")]
    InvalidDuration,
}
