//! Progressive feature unlocks
//!
//! Features open up as the organization runs the solver. The run count lives
//! under `solver_runs_count`; the first-unlock date of every feature lives
//! under `feature_unlock_dates` as a JSON map of feature key to date.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::storage::{get_json, keys, set_json, KeyValueStore, StorageError, StorageResult};

/// A feature gated on solver usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub key: &'static str,
    pub label: &'static str,
    /// Solver runs needed to unlock
    pub threshold: u32,
}

pub const FEATURES: &[Feature] = &[
    Feature {
        key: "calendar_export",
        label: "Calendar export",
        threshold: 1,
    },
    Feature {
        key: "shift_swaps",
        label: "Shift swap requests",
        threshold: 3,
    },
    Feature {
        key: "fairness_report",
        label: "Fairness report",
        threshold: 5,
    },
    Feature {
        key: "advanced_constraints",
        label: "Advanced constraints",
        threshold: 10,
    },
];

/// Unlock state of one feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStatus {
    pub feature: Feature,
    pub unlocked_on: Option<NaiveDate>,
    pub runs_remaining: u32,
}

pub struct FeatureUnlocks {
    store: Arc<dyn KeyValueStore>,
}

impl FeatureUnlocks {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Solver runs so far; an unreadable counter counts as zero
    pub fn runs_count(&self) -> StorageResult<u32> {
        match self.store.get_item(keys::SOLVER_RUNS_COUNT)? {
            Some(raw) => Ok(raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Resetting unreadable solver run count");
                0
            })),
            None => Ok(0),
        }
    }

    /// First-unlock date per feature key
    pub fn unlock_dates(&self) -> StorageResult<BTreeMap<String, NaiveDate>> {
        match get_json(self.store.as_ref(), keys::FEATURE_UNLOCK_DATES) {
            Ok(dates) => Ok(dates.unwrap_or_default()),
            Err(StorageError::InvalidValue { reason, .. }) => {
                tracing::warn!(%reason, "Discarding unreadable unlock dates");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_unlocked(&self, key: &str) -> StorageResult<bool> {
        let runs = self.runs_count()?;
        Ok(FEATURES
            .iter()
            .any(|f| f.key == key && runs >= f.threshold))
    }

    /// Count a solver run and return the features it unlocked.
    ///
    /// A feature is reported only the first time it crosses its threshold.
    pub fn record_solver_run(&self, today: NaiveDate) -> StorageResult<Vec<Feature>> {
        let runs = self.runs_count()?.saturating_add(1);
        self.store.set_item(keys::SOLVER_RUNS_COUNT, &runs.to_string())?;

        let mut dates = self.unlock_dates()?;
        let mut newly_unlocked = Vec::new();
        for feature in FEATURES.iter().filter(|f| runs >= f.threshold) {
            if !dates.contains_key(feature.key) {
                dates.insert(feature.key.to_string(), today);
                newly_unlocked.push(*feature);
            }
        }

        if !newly_unlocked.is_empty() {
            set_json(self.store.as_ref(), keys::FEATURE_UNLOCK_DATES, &dates)?;
            for feature in &newly_unlocked {
                tracing::info!(feature = feature.key, runs, "Feature unlocked");
            }
        }

        Ok(newly_unlocked)
    }

    pub fn status(&self) -> StorageResult<Vec<FeatureStatus>> {
        let runs = self.runs_count()?;
        let dates = self.unlock_dates()?;
        Ok(FEATURES
            .iter()
            .map(|feature| FeatureStatus {
                feature: *feature,
                unlocked_on: dates.get(feature.key).copied(),
                runs_remaining: feature.threshold.saturating_sub(runs),
            })
            .collect())
    }
}
