//! SMS broadcast composer

use std::collections::BTreeSet;

use crate::api::{ApiClient, ApiError, ApiResult, BroadcastRequest, BroadcastResult, Person};
use crate::config::SmsConfig;

/// Characters that fit a single-part SMS
pub const SINGLE_SEGMENT_CHARS: usize = 160;

/// Characters per part once a message is split
pub const MULTIPART_SEGMENT_CHARS: usize = 153;

/// SMS parts needed for a message, counted in Unicode scalar values
pub fn segment_count(message: &str) -> usize {
    let len = message.chars().count();
    match len {
        0 => 0,
        1..=SINGLE_SEGMENT_CHARS => 1,
        _ => len.div_ceil(MULTIPART_SEGMENT_CHARS),
    }
}

/// Estimated cost; the provider's invoice is authoritative
pub fn estimate_cost(segments: usize, recipients: usize, cost_per_segment: f64) -> f64 {
    segments as f64 * recipients as f64 * cost_per_segment
}

/// State of the send control
#[derive(Debug, Clone, PartialEq)]
pub struct SendButton {
    pub enabled: bool,
    pub label: String,
}

/// Composer state for one broadcast
#[derive(Debug, Clone)]
pub struct BroadcastComposer {
    recipients: Vec<Person>,
    selected: BTreeSet<i64>,
    message: String,
    cost_per_segment: f64,
    max_recipients: usize,
}

impl BroadcastComposer {
    pub fn new(settings: &SmsConfig) -> Self {
        Self {
            recipients: Vec::new(),
            selected: BTreeSet::new(),
            message: String::new(),
            cost_per_segment: settings.cost_per_segment,
            max_recipients: settings.max_recipients,
        }
    }

    /// Fetch the recipient list from the backend
    pub async fn load(&mut self, api: &ApiClient) -> ApiResult<()> {
        let people = api.list_sms_recipients().await?;
        self.set_recipients(people);
        Ok(())
    }

    /// Replace the recipient list, dropping selections that are no longer eligible
    pub fn set_recipients(&mut self, people: Vec<Person>) {
        self.recipients = people;
        let eligible: BTreeSet<i64> = self.eligible().map(|p| p.id).collect();
        self.selected.retain(|id| eligible.contains(id));
    }

    pub fn recipients(&self) -> &[Person] {
        &self.recipients
    }

    /// Recipients that may be selected
    pub fn eligible(&self) -> impl Iterator<Item = &Person> {
        self.recipients.iter().filter(|p| p.can_receive_sms())
    }

    /// Select a recipient; only SMS-capable people can be selected
    pub fn select(&mut self, id: i64) -> ApiResult<()> {
        match self.recipients.iter().find(|p| p.id == id) {
            Some(person) if person.can_receive_sms() => {
                self.selected.insert(id);
                Ok(())
            }
            Some(person) => Err(ApiError::Validation(format!(
                "{} cannot receive SMS (unverified phone or opted out)",
                person.name
            ))),
            None => Err(ApiError::Validation(format!("Unknown recipient {}", id))),
        }
    }

    pub fn deselect(&mut self, id: i64) {
        self.selected.remove(&id);
    }

    /// Select eligible recipients in list order, up to the cap
    pub fn select_all_eligible(&mut self) {
        let ids: Vec<i64> = self.eligible().map(|p| p.id).collect();
        for id in ids {
            if self.selected.len() >= self.max_recipients {
                break;
            }
            self.selected.insert(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn segments(&self) -> usize {
        segment_count(&self.message)
    }

    pub fn estimated_cost(&self) -> f64 {
        estimate_cost(self.segments(), self.selected.len(), self.cost_per_segment)
    }

    /// Character counter text, e.g. `172 characters · 2 segments`
    pub fn counter_label(&self) -> String {
        let segments = self.segments();
        format!(
            "{} characters · {} segment{}",
            self.message.chars().count(),
            segments,
            if segments == 1 { "" } else { "s" }
        )
    }

    pub fn send_button(&self) -> SendButton {
        let count = self.selected.len();
        if count > self.max_recipients {
            return SendButton {
                enabled: false,
                label: format!("Too many recipients (max {})", self.max_recipients),
            };
        }

        SendButton {
            enabled: count > 0 && !self.message.trim().is_empty(),
            label: match count {
                0 => "Send".to_string(),
                1 => "Send to 1 recipient".to_string(),
                n => format!("Send to {} recipients", n),
            },
        }
    }

    /// Build the request, or explain why sending is not possible
    pub fn request(&self) -> ApiResult<BroadcastRequest> {
        if self.message.trim().is_empty() {
            return Err(ApiError::Validation("Message is empty".to_string()));
        }
        match self.selected.len() {
            0 => Err(ApiError::Validation("Select at least one recipient".to_string())),
            n if n > self.max_recipients => Err(ApiError::Validation(format!(
                "At most {} recipients per broadcast",
                self.max_recipients
            ))),
            _ => Ok(BroadcastRequest {
                message: self.message.clone(),
                recipient_ids: self.selected_ids(),
            }),
        }
    }

    /// Send the broadcast; on success the composer is reset
    pub async fn send(&mut self, api: &ApiClient) -> ApiResult<BroadcastResult> {
        let request = self.request()?;
        let result = api.send_broadcast(&request).await?;

        tracing::info!(
            broadcast_id = result.id,
            recipients = request.recipient_ids.len(),
            segments = self.segments(),
            "Broadcast sent"
        );

        self.message.clear();
        self.selected.clear();
        Ok(result)
    }
}
