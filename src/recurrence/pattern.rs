//! Recurrence pattern types
//!
//! The pattern the composer collects and the backend expands. The end
//! condition is an enum so only the field that matches `end_condition`
//! ever exists; on the wire it is flattened into the pattern object:
//!
//! ```json
//! { "type": "weekly", "selected_days": ["monday"], "end_condition": "count", "occurrence_count": 8 }
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::error::RecurrenceError;

/// How a series repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Once,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    /// Every `interval` weeks on the selected days
    Custom,
}

impl std::str::FromStr for RecurrenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "once" => Ok(RecurrenceType::Once),
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "biweekly" => Ok(RecurrenceType::Biweekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            "custom" => Ok(RecurrenceType::Custom),
            other => Err(format!("Unknown recurrence type: {}", other)),
        }
    }
}

/// Day of the week, spelled out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl std::str::FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(DayOfWeek::Monday),
            "tue" | "tuesday" => Ok(DayOfWeek::Tuesday),
            "wed" | "wednesday" => Ok(DayOfWeek::Wednesday),
            "thu" | "thursday" => Ok(DayOfWeek::Thursday),
            "fri" | "friday" => Ok(DayOfWeek::Friday),
            "sat" | "saturday" => Ok(DayOfWeek::Saturday),
            "sun" | "sunday" => Ok(DayOfWeek::Sunday),
            other => Err(format!("Unknown weekday: {}", other)),
        }
    }
}

/// Which occurrence of a weekday within the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayPosition {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl std::str::FromStr for WeekdayPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "1" => Ok(WeekdayPosition::First),
            "second" | "2" => Ok(WeekdayPosition::Second),
            "third" | "3" => Ok(WeekdayPosition::Third),
            "fourth" | "4" => Ok(WeekdayPosition::Fourth),
            "last" | "-1" => Ok(WeekdayPosition::Last),
            other => Err(format!("Unknown weekday position: {}", other)),
        }
    }
}

/// When a series stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "end_condition", rename_all = "snake_case")]
pub enum EndCondition {
    Date { end_date: NaiveDate },
    Count { occurrence_count: u32 },
    Indefinite,
}

/// A recurrence description as collected by the composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_days: BTreeSet<DayOfWeek>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_position: Option<WeekdayPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_name: Option<DayOfWeek>,
    #[serde(flatten)]
    pub end: EndCondition,
}

impl RecurrencePattern {
    pub fn new(kind: RecurrenceType, end: EndCondition) -> Self {
        Self {
            kind,
            selected_days: BTreeSet::new(),
            interval: None,
            weekday_position: None,
            weekday_name: None,
            end,
        }
    }

    /// A single occurrence
    pub fn once() -> Self {
        Self::new(RecurrenceType::Once, EndCondition::Count { occurrence_count: 1 })
    }

    /// Builder method: add a selected day
    pub fn day(mut self, day: DayOfWeek) -> Self {
        self.selected_days.insert(day);
        self
    }

    /// Builder method: set the interval
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Builder method: repeat on e.g. the second Tuesday
    pub fn monthly_weekday(mut self, position: WeekdayPosition, day: DayOfWeek) -> Self {
        self.weekday_position = Some(position);
        self.weekday_name = Some(day);
        self
    }

    /// Check the pattern before asking the backend to expand it
    pub fn validate(&self, start_date: NaiveDate) -> Result<(), RecurrenceError> {
        match self.kind {
            RecurrenceType::Weekly | RecurrenceType::Biweekly => {
                if self.selected_days.is_empty() {
                    return Err(RecurrenceError::NoDaysSelected);
                }
            }
            RecurrenceType::Custom => {
                if self.interval.unwrap_or(0) < 1 {
                    return Err(RecurrenceError::InvalidInterval);
                }
                if self.selected_days.is_empty() {
                    return Err(RecurrenceError::NoDaysSelected);
                }
            }
            RecurrenceType::Monthly => {
                if self.weekday_position.is_some() != self.weekday_name.is_some() {
                    return Err(RecurrenceError::IncompleteMonthlyWeekday);
                }
            }
            RecurrenceType::Once | RecurrenceType::Daily => {}
        }

        match &self.end {
            EndCondition::Count { occurrence_count } if *occurrence_count < 1 => {
                Err(RecurrenceError::InvalidCount)
            }
            EndCondition::Date { end_date } if *end_date < start_date => {
                Err(RecurrenceError::EndBeforeStart {
                    start: start_date,
                    end: *end_date,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Pattern plus the first occurrence's date, time and length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRequest {
    pub pattern: RecurrencePattern,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl PreviewRequest {
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        if self.duration_minutes == 0 {
            return Err(RecurrenceError::InvalidDuration);
        }
        self.pattern.validate(self.start_date)
    }
}

/// One concrete instance produced by the backend expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub sequence: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub is_holiday_conflict: bool,
    #[serde(default)]
    pub holiday_label: Option<String>,
}

/// Backend answer to a preview request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// Create a server-side series from a pattern
#[derive(Debug, Clone, Serialize)]
pub struct NewSeries {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(flatten)]
    pub schedule: PreviewRequest,
}

/// A series stored by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecurringSeries {
    pub id: i64,
    #[serde(default)]
    pub occurrence_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_end_condition_flattened() {
        let pattern = RecurrencePattern::new(
            RecurrenceType::Weekly,
            EndCondition::Count { occurrence_count: 8 },
        )
        .day(DayOfWeek::Monday)
        .day(DayOfWeek::Thursday);

        let value = serde_json::to_value(&pattern).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "weekly",
                "selected_days": ["monday", "thursday"],
                "end_condition": "count",
                "occurrence_count": 8
            })
        );
        assert!(value.get("end_date").is_none());
    }

    #[test]
    fn test_end_condition_parsed() {
        let pattern: RecurrencePattern = serde_json::from_value(json!({
            "type": "monthly",
            "weekday_position": "last",
            "weekday_name": "friday",
            "end_condition": "date",
            "end_date": "2026-12-31"
        }))
        .unwrap();

        assert_eq!(pattern.kind, RecurrenceType::Monthly);
        assert_eq!(
            pattern.end,
            EndCondition::Date {
                end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
            }
        );

        let indefinite: RecurrencePattern =
            serde_json::from_value(json!({"type": "daily", "end_condition": "indefinite"})).unwrap();
        assert_eq!(indefinite.end, EndCondition::Indefinite);
    }

    #[test]
    fn test_weekly_needs_days() {
        let pattern = RecurrencePattern::new(RecurrenceType::Biweekly, EndCondition::Indefinite);
        assert_eq!(pattern.validate(start()), Err(RecurrenceError::NoDaysSelected));
        assert!(pattern.day(DayOfWeek::Saturday).validate(start()).is_ok());
    }

    #[test]
    fn test_custom_needs_interval() {
        let pattern = RecurrencePattern::new(RecurrenceType::Custom, EndCondition::Indefinite)
            .day(DayOfWeek::Tuesday);
        assert_eq!(pattern.validate(start()), Err(RecurrenceError::InvalidInterval));
        assert_eq!(
            pattern.clone().interval(0).validate(start()),
            Err(RecurrenceError::InvalidInterval)
        );
        assert!(pattern.interval(3).validate(start()).is_ok());
    }

    #[test]
    fn test_monthly_weekday_both_or_neither() {
        let mut pattern = RecurrencePattern::new(RecurrenceType::Monthly, EndCondition::Indefinite);
        assert!(pattern.validate(start()).is_ok());

        pattern.weekday_position = Some(WeekdayPosition::Second);
        assert_eq!(
            pattern.validate(start()),
            Err(RecurrenceError::IncompleteMonthlyWeekday)
        );

        pattern.weekday_name = Some(DayOfWeek::Tuesday);
        assert!(pattern.validate(start()).is_ok());
    }

    #[test]
    fn test_end_conditions_checked() {
        let zero = RecurrencePattern::new(
            RecurrenceType::Daily,
            EndCondition::Count { occurrence_count: 0 },
        );
        assert_eq!(zero.validate(start()), Err(RecurrenceError::InvalidCount));

        let early = RecurrencePattern::new(
            RecurrenceType::Daily,
            EndCondition::Date {
                end_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            },
        );
        assert!(matches!(
            early.validate(start()),
            Err(RecurrenceError::EndBeforeStart { .. })
        ));

        let same_day = RecurrencePattern::new(
            RecurrenceType::Daily,
            EndCondition::Date { end_date: start() },
        );
        assert!(same_day.validate(start()).is_ok());
    }

    #[test]
    fn test_preview_request_shape() {
        let request = PreviewRequest {
            pattern: RecurrencePattern::once(),
            start_date: start(),
            start_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            duration_minutes: 90,
        };
        assert!(request.validate().is_ok());

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["start_date"], "2026-03-02");
        assert_eq!(value["start_time"], "09:30:00");
        assert_eq!(value["pattern"]["type"], "once");

        let zero = PreviewRequest {
            duration_minutes: 0,
            ..request
        };
        assert_eq!(zero.validate(), Err(RecurrenceError::InvalidDuration));
    }

    #[test]
    fn test_weekday_parsing() {
        assert_eq!("Tue".parse::<DayOfWeek>(), Ok(DayOfWeek::Tuesday));
        assert_eq!("sunday".parse::<DayOfWeek>(), Ok(DayOfWeek::Sunday));
        assert!("someday".parse::<DayOfWeek>().is_err());
        assert_eq!(DayOfWeek::from(chrono::Weekday::Wed), DayOfWeek::Wednesday);
    }
}
