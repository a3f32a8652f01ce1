//! Recurring-event preview
//!
//! Every edit in the composer calls [`PreviewController::input_changed`].
//! Edits are debounced; once the input has been quiet for the debounce
//! period the pattern is validated and sent to the backend expansion service.
//!
//! At most one preview request is outstanding. A trigger that fires while a
//! request is in flight is dropped, not queued, so the preview can lag the
//! latest input until the next edit.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::pattern::{Occurrence, PreviewRequest, PreviewResponse};
use crate::api::ApiResult;
use crate::config::RecurringConfig;

/// Backend expansion service
#[async_trait]
pub trait PreviewSource: Send + Sync {
    async fn preview(&self, request: &PreviewRequest) -> ApiResult<PreviewResponse>;
}

/// Preview tuning
#[derive(Debug, Clone)]
pub struct PreviewSettings {
    pub debounce: Duration,
    /// Occurrences shown in the list
    pub limit: usize,
    /// Total at which the warning appears
    pub warning_threshold: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self::from(&RecurringConfig::default())
    }
}

impl From<&RecurringConfig> for PreviewSettings {
    fn from(config: &RecurringConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.preview_debounce_ms),
            limit: config.preview_limit,
            warning_threshold: config.preview_warning_threshold,
        }
    }
}

/// What the preview panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSummary {
    /// First occurrences, at most `limit`
    pub occurrences: Vec<Occurrence>,
    /// Total occurrences in the series
    pub total: usize,
    /// Shown occurrences that collide with a holiday
    pub holiday_conflicts: usize,
    pub warning: Option<String>,
}

impl PreviewSummary {
    pub fn from_response(response: PreviewResponse, settings: &PreviewSettings) -> Self {
        let total = response.total_count.unwrap_or(response.occurrences.len());
        let occurrences: Vec<Occurrence> = response
            .occurrences
            .into_iter()
            .take(settings.limit)
            .collect();
        let holiday_conflicts = occurrences.iter().filter(|o| o.is_holiday_conflict).count();

        let warning = (total >= settings.warning_threshold).then(|| {
            format!(
                "This pattern creates {} events. Consider an end date or a smaller count.",
                total
            )
        });

        Self {
            occurrences,
            total,
            holiday_conflicts,
            warning,
        }
    }

    /// Occurrences beyond the listed ones
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.occurrences.len())
    }
}

/// State of the preview panel
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewState {
    Idle,
    Loading,
    Invalid(String),
    Ready(PreviewSummary),
    Failed(String),
}

struct Inner {
    source: Arc<dyn PreviewSource>,
    settings: PreviewSettings,
    generation: AtomicU64,
    /// Bumped whenever an invalid pattern is published
    invalidations: AtomicU64,
    in_flight: AtomicBool,
    state: watch::Sender<PreviewState>,
}

/// Debounced, single-flight preview driver
#[derive(Clone)]
pub struct PreviewController {
    inner: Arc<Inner>,
}

impl PreviewController {
    pub fn new(source: Arc<dyn PreviewSource>, settings: PreviewSettings) -> Self {
        let (state, _) = watch::channel(PreviewState::Idle);
        Self {
            inner: Arc::new(Inner {
                source,
                settings,
                generation: AtomicU64::new(0),
                invalidations: AtomicU64::new(0),
                in_flight: AtomicBool::new(false),
                state,
            }),
        }
    }

    /// Follow preview state changes
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.inner.state.subscribe()
    }

    /// Current preview state
    pub fn state(&self) -> PreviewState {
        self.inner.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Record an input change.
    ///
    /// Only the last change within the debounce window reaches the backend.
    pub fn input_changed(&self, request: PreviewRequest) -> JoinHandle<()> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let controller = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(controller.inner.settings.debounce).await;
            if controller.inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            controller.refresh_now(&request).await;
        })
    }

    /// Request a preview immediately.
    ///
    /// Returns `false` when the trigger was dropped because a request is
    /// already in flight or the pattern is invalid.
    pub async fn refresh_now(&self, request: &PreviewRequest) -> bool {
        if let Err(e) = request.validate() {
            self.inner.invalidations.fetch_add(1, Ordering::SeqCst);
            self.inner.state.send_replace(PreviewState::Invalid(e.to_string()));
            return false;
        }

        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("Preview already in flight, dropping trigger");
            return false;
        }

        self.inner.state.send_replace(PreviewState::Loading);
        let invalidations = self.inner.invalidations.load(Ordering::SeqCst);

        let next = match self.inner.source.preview(request).await {
            Ok(response) => {
                let summary = PreviewSummary::from_response(response, &self.inner.settings);
                tracing::debug!(total = summary.total, shown = summary.occurrences.len(), "Preview ready");
                PreviewState::Ready(summary)
            }
            Err(e) => {
                tracing::error!("Preview failed: {}", e);
                PreviewState::Failed(e.user_message())
            }
        };

        // The pattern went invalid while this request was out; its result is stale
        if self.inner.invalidations.load(Ordering::SeqCst) == invalidations {
            self.inner.state.send_replace(next);
        } else {
            tracing::debug!("Discarding preview for a pattern that was since edited");
        }
        self.inner.in_flight.store(false, Ordering::SeqCst);
        true
    }
}
