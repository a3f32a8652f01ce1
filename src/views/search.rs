//! Search and filter over loaded people and events
//!
//! Text matching is case-insensitive substring matching. Phone numbers are
//! compared on their digits only, so `555-0101` finds `+1 (555) 0101`.

use chrono::{DateTime, Utc};

use crate::api::{Event, Person, PersonStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeopleFilter {
    /// Matched against name, e-mail and phone
    pub text: Option<String>,
    pub team_id: Option<i64>,
    pub status: Option<PersonStatus>,
    /// Only people who can receive SMS
    pub sms_capable: bool,
}

impl PeopleFilter {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn team(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn status(mut self, status: PersonStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, person: &Person) -> bool {
        if let Some(team_id) = self.team_id {
            if !person.team_ids.contains(&team_id) {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != person.status) {
            return false;
        }
        if self.sms_capable && !person.can_receive_sms() {
            return false;
        }

        match normalized(self.text.as_deref()) {
            None => true,
            Some(needle) => {
                contains(&person.name, &needle)
                    || person.email.as_deref().is_some_and(|e| contains(e, &needle))
                    || person.phone.as_deref().is_some_and(|p| phone_matches(p, &needle))
            }
        }
    }

    pub fn apply<'a>(&self, people: &'a [Person]) -> Vec<&'a Person> {
        people.iter().filter(|p| self.matches(p)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Matched against title and location
    pub text: Option<String>,
    pub team_id: Option<i64>,
    /// Events ending after this instant
    pub from: Option<DateTime<Utc>>,
    /// Events starting before this instant
    pub to: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if self.team_id.is_some() && event.team_id != self.team_id {
            return false;
        }
        if self.from.is_some_and(|from| event.end_time <= from) {
            return false;
        }
        if self.to.is_some_and(|to| event.start_time >= to) {
            return false;
        }

        match normalized(self.text.as_deref()) {
            None => true,
            Some(needle) => {
                contains(&event.title, &needle)
                    || event.location.as_deref().is_some_and(|l| contains(l, &needle))
            }
        }
    }

    /// Matching events in chronological order
    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        let mut matched: Vec<&Event> = events.iter().filter(|e| self.matches(e)).collect();
        matched.sort_by_key(|e| e.start_time);
        matched
    }
}

fn normalized(text: Option<&str>) -> Option<String> {
    text.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty())
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn phone_matches(phone: &str, needle: &str) -> bool {
    let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
    let needle_digits = digits(needle);
    !needle_digits.is_empty() && digits(phone).contains(&needle_digits)
}
