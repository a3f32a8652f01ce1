//! Data Transfer Objects
//!
//! Request and response types for the backend REST API. The backend owns
//! every entity; these are transient view-models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Organization, User};

// ============================================
// Auth
// ============================================

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub organization_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Response to login, signup and invitation acceptance
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    #[serde(alias = "org")]
    pub organization: Organization,
}

/// Result of validating an invitation token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationDetails {
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub inviter_name: Option<String>,
}

/// Result of validating a password-reset token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetTokenStatus {
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
}

/// Accept an invitation and create the account
#[derive(Debug, Clone, Serialize)]
pub struct AcceptInvitationRequest {
    pub token: String,
    pub name: String,
    pub password: String,
}

// ============================================
// People and teams
// ============================================

/// Person status within the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    #[default]
    Active,
    Inactive,
    Invited,
}

/// A volunteer or coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub sms_opt_out: bool,
    #[serde(default)]
    pub team_ids: Vec<i64>,
    #[serde(default)]
    pub status: PersonStatus,
}

impl Person {
    /// Whether this person may receive SMS broadcasts
    pub fn can_receive_sms(&self) -> bool {
        self.phone
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false)
            && self.phone_verified
            && !self.sms_opt_out
    }
}

/// Create or update a person
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team_ids: Vec<i64>,
}

/// A team of volunteers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_count: u32,
}

/// Create or update a team
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================
// Events
// ============================================

/// A scheduled event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub volunteers_needed: Option<u32>,
}

/// Create an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volunteers_needed: Option<u32>,
}

// ============================================
// Messaging
// ============================================

/// SMS broadcast request
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastRequest {
    pub message: String,
    pub recipient_ids: Vec<i64>,
}

/// Backend acknowledgement of a broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub id: i64,
    #[serde(default)]
    pub recipient_count: u32,
    #[serde(default)]
    pub status: Option<String>,
}

/// A past broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub recipient_count: u32,
    #[serde(default)]
    pub delivered_count: u32,
}

/// Invitation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

/// An invitation sent to an e-mail address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i64,
    pub email: String,
    pub status: InvitationStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Send one invitation
#[derive(Debug, Clone, Serialize)]
pub struct InvitationRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

// ============================================
// Solver
// ============================================

/// Solver solution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A schedule produced by the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: i64,
    pub status: SolutionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub assignment_count: u32,
    #[serde(default)]
    pub unfilled_count: u32,
}

/// Ask the solver for a new schedule
#[derive(Debug, Clone, Serialize)]
pub struct SolverRunRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// ============================================
// Billing
// ============================================

/// A subscription plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub volunteer_limit: Option<u32>,
}

fn default_interval() -> String {
    "month".to_string()
}

/// The organization's subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub plan_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub volunteer_count: u32,
    #[serde(default)]
    pub volunteer_limit: Option<u32>,
}

/// Redirect URL handed out by the billing provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectUrl {
    pub url: String,
}

// ============================================
// Onboarding
// ============================================

/// Wizard progress as stored by the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OnboardingProgress {
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub completed_steps: Vec<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Sample data currently loaded for the organization
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleDataStatus {
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub people: u32,
    #[serde(default)]
    pub teams: u32,
    #[serde(default)]
    pub events: u32,
}

// ============================================
// Analytics
// ============================================

/// Admin analytics for a date range
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    #[serde(default)]
    pub total_shifts: u32,
    #[serde(default)]
    pub filled_shifts: u32,
    #[serde(default)]
    pub total_volunteers: u32,
    #[serde(default)]
    pub active_volunteers: u32,
    #[serde(default)]
    pub sms_sent: u32,
    #[serde(default)]
    pub sms_delivered: u32,
    #[serde(default)]
    pub events: u32,
}
