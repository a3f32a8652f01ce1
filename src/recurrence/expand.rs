//! Client-side series expansion
//!
//! The fixed-interval create path: step a cursor from the first start time
//! until it passes the end date, then create one event per occurrence.
//! Stepping works on local wall-clock time, so a daily 9:00 shift stays at
//! 9:00 across DST changes and a monthly series keeps its day of month
//! (clamped to the month's last day).

use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, Months, TimeZone, Utc};

use crate::api::{ApiError, ApiResult, Event, NewEvent};

/// Hard cap on generated occurrences
pub const MAX_OCCURRENCES: usize = 365;

/// Default horizon when no end date is given
pub const DEFAULT_HORIZON_DAYS: i64 = 365;

/// Step used by the client-side generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl std::str::FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "once" => Ok(Cadence::Once),
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(format!("Unknown cadence: {}", other)),
        }
    }
}

/// Start and end of one generated occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceWindow<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// Generate occurrence windows.
///
/// `until` defaults to `start + 365 days`. Never yields more than
/// [`MAX_OCCURRENCES`] windows, and never one starting after `until`.
pub fn expand<Tz: TimeZone>(
    start: DateTime<Tz>,
    duration: Duration,
    cadence: Cadence,
    until: Option<DateTime<Tz>>,
) -> Vec<OccurrenceWindow<Tz>> {
    let until = until.unwrap_or_else(|| start.clone() + Duration::days(DEFAULT_HORIZON_DAYS));
    let mut windows = Vec::new();

    for step in 0..MAX_OCCURRENCES {
        if cadence == Cadence::Once && step > 0 {
            break;
        }

        let cursor = match advance(&start, cadence, step as u32) {
            Some(cursor) => cursor,
            // Wall time does not exist on this day (DST gap) or the calendar overflowed
            None => {
                tracing::debug!(step, "Skipping unrepresentable occurrence");
                continue;
            }
        };

        if cursor > until {
            break;
        }

        windows.push(OccurrenceWindow {
            end: cursor.clone() + duration,
            start: cursor,
        });
    }

    windows
}

fn advance<Tz: TimeZone>(start: &DateTime<Tz>, cadence: Cadence, step: u32) -> Option<DateTime<Tz>> {
    match cadence {
        Cadence::Once => Some(start.clone()),
        Cadence::Daily => start.clone().checked_add_days(Days::new(step as u64)),
        Cadence::Weekly => start.clone().checked_add_days(Days::new(step as u64 * 7)),
        Cadence::Monthly => start.clone().checked_add_months(Months::new(step)),
    }
}

/// Destination for created events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn create_event(&self, event: &NewEvent) -> ApiResult<Event>;
}

/// Fields shared by every event of a series
#[derive(Debug, Clone, Default)]
pub struct EventTemplate {
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub team_id: Option<i64>,
    pub volunteers_needed: Option<u32>,
}

impl EventTemplate {
    fn instantiate<Tz: TimeZone>(&self, window: &OccurrenceWindow<Tz>) -> NewEvent {
        NewEvent {
            title: self.title.clone(),
            start_time: window.start.with_timezone(&Utc),
            end_time: window.end.with_timezone(&Utc),
            location: self.location.clone(),
            description: self.description.clone(),
            team_id: self.team_id,
            volunteers_needed: self.volunteers_needed,
        }
    }
}

/// Result of creating a series one event at a time
#[derive(Debug, Default)]
pub struct SeriesOutcome {
    /// Occurrences the caller asked for
    pub requested: usize,
    /// Events the backend created
    pub created: Vec<Event>,
    /// Zero-based index and message of each failed occurrence
    pub failures: Vec<(usize, String)>,
    /// Set when the session expired part-way through
    pub aborted: bool,
}

impl SeriesOutcome {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn is_complete(&self) -> bool {
        self.created.len() == self.requested
    }

    /// One-line summary for a toast
    pub fn summary(&self) -> String {
        format!("Created {} of {} events", self.created.len(), self.requested)
    }
}

/// Create one event per window.
///
/// There is no rollback: failed occurrences are recorded and skipped, and a
/// partially created series stays on the backend. An expired session stops
/// the loop since every later request would be rejected too.
pub async fn create_series<Tz: TimeZone>(
    sink: &dyn EventSink,
    template: &EventTemplate,
    windows: &[OccurrenceWindow<Tz>],
) -> SeriesOutcome {
    let mut outcome = SeriesOutcome {
        requested: windows.len(),
        ..Default::default()
    };

    for (index, window) in windows.iter().enumerate() {
        let event = template.instantiate(window);
        match sink.create_event(&event).await {
            Ok(created) => outcome.created.push(created),
            Err(ApiError::Unauthorized { .. }) => {
                tracing::warn!(index, "Session expired while creating series");
                outcome.failures.push((index, "Session expired".to_string()));
                outcome.aborted = true;
                break;
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "Failed to create occurrence");
                outcome.failures.push((index, e.user_message()));
            }
        }
    }

    tracing::info!(
        requested = outcome.requested,
        created = outcome.created.len(),
        "Recurring series created"
    );

    outcome
}
