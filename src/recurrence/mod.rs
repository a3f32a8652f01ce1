//! Recurring Events
//!
//! Two ways to create a series:
//!
//! - **client-driven** ([`expand`]): step a cursor daily/weekly/monthly from
//!   the first start time and create one event per occurrence
//! - **server-driven** ([`preview`]): send a [`RecurrencePattern`] to the
//!   backend, show a preview of the expansion, then create the series there
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use crewdesk::recurrence::{expand, Cadence};
//!
//! let start = Utc.with_ymd_and_hms(2026, 5, 4, 17, 0, 0).unwrap();
//! let windows = expand(start, Duration::hours(2), Cadence::Weekly, Some(start + Duration::weeks(3)));
//! assert_eq!(windows.len(), 4);
//! ```

pub mod error;
pub mod expand;
pub mod pattern;
pub mod preview;

pub use error::RecurrenceError;
pub use expand::{
    create_series, expand, Cadence, EventSink, EventTemplate, OccurrenceWindow, SeriesOutcome,
    DEFAULT_HORIZON_DAYS, MAX_OCCURRENCES,
};
pub use pattern::{
    DayOfWeek, EndCondition, NewSeries, Occurrence, PreviewRequest, PreviewResponse,
    RecurrencePattern, RecurrenceType, RecurringSeries, WeekdayPosition,
};
pub use preview::{PreviewController, PreviewSettings, PreviewSource, PreviewState, PreviewSummary};
