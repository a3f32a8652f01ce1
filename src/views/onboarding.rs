//! Onboarding wizard
//!
//! Walks a new coordinator through organization → team → first event →
//! invite → done. [`WizardState`] carries the current step and everything
//! collected so far; each step validates its own fields before advancing, and
//! progress is mirrored to the backend so the wizard resumes where it stopped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::invitations::{is_valid_email, send_bulk, BulkInviteReport};
use crate::api::{ApiClient, ApiError, ApiResult, NewEvent, OnboardingProgress, TeamInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Organization,
    Team,
    FirstEvent,
    Invite,
    Done,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 5] = [
        WizardStep::Organization,
        WizardStep::Team,
        WizardStep::FirstEvent,
        WizardStep::Invite,
        WizardStep::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Organization => "organization",
            WizardStep::Team => "team",
            WizardStep::FirstEvent => "first_event",
            WizardStep::Invite => "invite",
            WizardStep::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ORDER.iter().copied().find(|step| step.as_str() == s)
    }

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Self> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }
}

/// Data collected across steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardData {
    pub org_name: String,
    pub timezone: Option<String>,
    pub team_name: String,
    pub team_description: Option<String>,
    pub event_title: String,
    pub event_start: Option<DateTime<Utc>>,
    pub event_duration_minutes: u32,
    pub event_location: Option<String>,
    pub invite_emails: Vec<String>,
}

/// Wizard position plus collected data
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub step: WizardStep,
    pub data: WizardData,
    completed: Vec<WizardStep>,
    team_id: Option<i64>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::Organization,
            data: WizardData {
                event_duration_minutes: 120,
                ..Default::default()
            },
            completed: Vec::new(),
            team_id: None,
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from backend progress
    pub fn from_progress(progress: &OnboardingProgress) -> Self {
        let mut state = Self::new();
        state.completed = progress
            .completed_steps
            .iter()
            .filter_map(|s| WizardStep::parse(s))
            .collect();
        state.step = if progress.completed {
            WizardStep::Done
        } else {
            progress
                .current_step
                .as_deref()
                .and_then(WizardStep::parse)
                .unwrap_or(WizardStep::Organization)
        };
        state
    }

    pub fn progress(&self) -> OnboardingProgress {
        OnboardingProgress {
            current_step: Some(self.step.as_str().to_string()),
            completed_steps: self.completed.iter().map(|s| s.as_str().to_string()).collect(),
            completed: self.step == WizardStep::Done,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step == WizardStep::Done
    }

    /// Percentage of steps completed
    pub fn percent_complete(&self) -> u8 {
        let total = WizardStep::ORDER.len() - 1;
        ((self.completed.len().min(total) * 100) / total) as u8
    }

    /// Check the fields of the current step
    pub fn validate(&self) -> ApiResult<()> {
        let data = &self.data;
        let problem = match self.step {
            WizardStep::Organization if data.org_name.trim().is_empty() => {
                Some("Organization name is required".to_string())
            }
            WizardStep::Organization if data.org_name.trim().chars().count() > 100 => {
                Some("Organization name must be at most 100 characters".to_string())
            }
            WizardStep::Team if data.team_name.trim().is_empty() => Some("Team name is required".to_string()),
            WizardStep::FirstEvent if data.event_title.trim().is_empty() => {
                Some("Event title is required".to_string())
            }
            WizardStep::FirstEvent if data.event_start.is_none() => {
                Some("Event start time is required".to_string())
            }
            WizardStep::FirstEvent if data.event_duration_minutes == 0 => {
                Some("Event duration must be positive".to_string())
            }
            WizardStep::Invite => data
                .invite_emails
                .iter()
                .find(|e| !is_valid_email(e))
                .map(|e| format!("Invalid e-mail address: {}", e)),
            _ => None,
        };

        match problem {
            Some(message) => Err(ApiError::Validation(message)),
            None => Ok(()),
        }
    }

    /// Validate and move forward locally
    pub fn advance(&mut self) -> ApiResult<WizardStep> {
        self.validate()?;
        if !self.completed.contains(&self.step) && self.step != WizardStep::Done {
            self.completed.push(self.step);
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Step back without validation
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            if self.step != WizardStep::Done {
                self.step = previous;
            }
        }
        self.step
    }

    fn first_event(&self) -> ApiResult<NewEvent> {
        let start = self
            .data
            .event_start
            .ok_or_else(|| ApiError::Validation("Event start time is required".to_string()))?;
        Ok(NewEvent {
            title: self.data.event_title.trim().to_string(),
            start_time: start,
            end_time: start + Duration::minutes(self.data.event_duration_minutes as i64),
            location: self.data.event_location.clone(),
            description: None,
            team_id: self.team_id,
            volunteers_needed: None,
        })
    }
}

/// Drives a [`WizardState`] against the backend
pub struct OnboardingWizard<'a> {
    api: &'a ApiClient,
    pub state: WizardState,
    pub last_invites: Option<BulkInviteReport>,
}

impl<'a> OnboardingWizard<'a> {
    /// Load saved progress, starting fresh when there is none
    pub async fn resume(api: &'a ApiClient) -> ApiResult<Self> {
        let state = match api.get_onboarding_progress().await {
            Ok(progress) => WizardState::from_progress(&progress),
            Err(ApiError::Status { status: 404, .. }) => WizardState::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            api,
            state,
            last_invites: None,
        })
    }

    pub fn with_state(api: &'a ApiClient, state: WizardState) -> Self {
        Self {
            api,
            state,
            last_invites: None,
        }
    }

    /// Submit the current step, perform its side effect and sync progress
    pub async fn submit(&mut self) -> ApiResult<WizardStep> {
        self.state.validate()?;

        match self.state.step {
            WizardStep::Organization => {
                let mut session = self
                    .api
                    .session()
                    .current()
                    .ok_or_else(|| ApiError::Validation("Not logged in".to_string()))?;
                session.org.name = self.state.data.org_name.trim().to_string();
                if let Some(tz) = &self.state.data.timezone {
                    session.org.timezone = Some(tz.clone());
                }
                self.api.session().switch_org(session.org)?;
            }
            WizardStep::Team => {
                let team = self
                    .api
                    .create_team(&TeamInput {
                        name: self.state.data.team_name.trim().to_string(),
                        description: self.state.data.team_description.clone(),
                    })
                    .await?;
                self.state.team_id = Some(team.id);
            }
            WizardStep::FirstEvent => {
                let event = self.state.first_event()?;
                self.api.create_event(&event).await?;
            }
            WizardStep::Invite => {
                if !self.state.data.invite_emails.is_empty() {
                    let report = send_bulk(self.api, &self.state.data.invite_emails, None).await;
                    if report.aborted {
                        return Err(ApiError::Unauthorized {
                            redirect: crate::api::LOGIN_PATH.to_string(),
                        });
                    }
                    self.last_invites = Some(report);
                }
            }
            WizardStep::Done => return Ok(WizardStep::Done),
        }

        let step = self.state.advance()?;
        self.api.save_onboarding_progress(&self.state.progress()).await?;
        tracing::info!(step = step.as_str(), "Onboarding advanced");
        Ok(step)
    }

    /// Skip the invite step
    pub async fn skip_invites(&mut self) -> ApiResult<WizardStep> {
        if self.state.step != WizardStep::Invite {
            return Err(ApiError::Validation("Only the invite step can be skipped".to_string()));
        }
        self.state.data.invite_emails.clear();
        self.submit().await
    }
}
