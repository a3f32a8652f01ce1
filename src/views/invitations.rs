//! Bulk invitations
//!
//! Addresses come from free text (comma, semicolon or whitespace separated)
//! or a CSV file with an `email` column. Each valid, de-duplicated address
//! gets its own invitation request; failures are collected, never retried.

use regex::Regex;
use std::collections::HashSet;
use std::io::Read;
use std::sync::OnceLock;

use crate::api::{ApiClient, ApiError, ApiResult, Invitation, InvitationRequest, InvitationStatus};

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().map(|re| re.is_match(email)).unwrap_or(false)
}

/// Parsed address list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressList {
    /// Valid addresses, lowercased, first occurrence order
    pub valid: Vec<String>,
    /// Entries that are not e-mail addresses
    pub invalid: Vec<String>,
    /// Repeated entries that were dropped
    pub duplicates: usize,
}

impl AddressList {
    fn push(&mut self, seen: &mut HashSet<String>, raw: &str) {
        let entry = raw.trim().trim_matches(|c| c == '<' || c == '>');
        if entry.is_empty() {
            return;
        }
        if !is_valid_email(entry) {
            self.invalid.push(entry.to_string());
            return;
        }
        let normalized = entry.to_lowercase();
        if seen.insert(normalized.clone()) {
            self.valid.push(normalized);
        } else {
            self.duplicates += 1;
        }
    }
}

/// Split pasted text into addresses
pub fn parse_addresses(text: &str) -> AddressList {
    let mut list = AddressList::default();
    let mut seen = HashSet::new();
    for raw in text.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        list.push(&mut seen, raw);
    }
    list
}

/// Read addresses from CSV with a header row containing `email`
pub fn parse_csv<R: Read>(reader: R) -> ApiResult<AddressList> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| ApiError::Validation(format!("Invalid CSV: {}", e)))?;
    let column = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("email"))
        .ok_or_else(|| ApiError::Validation("CSV has no 'email' column".to_string()))?;

    let mut list = AddressList::default();
    let mut seen = HashSet::new();
    for record in csv.records() {
        let record = record.map_err(|e| ApiError::Validation(format!("Invalid CSV: {}", e)))?;
        if let Some(value) = record.get(column) {
            list.push(&mut seen, value);
        }
    }
    Ok(list)
}

/// Outcome of a bulk send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkInviteReport {
    pub sent: Vec<Invitation>,
    /// Address and error message for each failure
    pub failed: Vec<(String, String)>,
    pub aborted: bool,
}

impl BulkInviteReport {
    pub fn summary(&self) -> String {
        let total = self.sent.len() + self.failed.len();
        if self.failed.is_empty() {
            format!("Sent {} invitation{}", self.sent.len(), if total == 1 { "" } else { "s" })
        } else {
            format!("Sent {} of {} invitations", self.sent.len(), total)
        }
    }
}

/// Send one invitation per address, sequentially
pub async fn send_bulk(api: &ApiClient, addresses: &[String], role: Option<&str>) -> BulkInviteReport {
    let mut report = BulkInviteReport::default();

    for email in addresses {
        let request = InvitationRequest {
            email: email.clone(),
            role: role.map(str::to_string),
        };
        match api.send_invitation(&request).await {
            Ok(invitation) => report.sent.push(invitation),
            Err(ApiError::Unauthorized { .. }) => {
                report.failed.push((email.clone(), "Session expired".to_string()));
                report.aborted = true;
                break;
            }
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Invitation failed");
                report.failed.push((email.clone(), e.user_message()));
            }
        }
    }

    tracing::info!(sent = report.sent.len(), failed = report.failed.len(), "Bulk invitations finished");
    report
}

/// Invitations still waiting for an answer
pub fn pending(invitations: &[Invitation]) -> Vec<&Invitation> {
    invitations
        .iter()
        .filter(|i| i.status == InvitationStatus::Pending)
        .collect()
}
