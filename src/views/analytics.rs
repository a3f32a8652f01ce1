//! Admin analytics
//!
//! Rates are derived client-side from the raw counts the backend returns.
//! A rate with a zero denominator is `None` rather than zero.

use std::fmt;
use std::str::FromStr;

use crate::api::{AnalyticsSummary, ApiClient, ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyticsRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl AnalyticsRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsRange::Week => "7d",
            AnalyticsRange::Month => "30d",
            AnalyticsRange::Quarter => "90d",
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            AnalyticsRange::Week => 7,
            AnalyticsRange::Month => 30,
            AnalyticsRange::Quarter => 90,
        }
    }
}

impl fmt::Display for AnalyticsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsRange {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(AnalyticsRange::Week),
            "30d" => Ok(AnalyticsRange::Month),
            "90d" => Ok(AnalyticsRange::Quarter),
            other => Err(ApiError::Validation(format!(
                "Unknown range '{}' (expected 7d, 30d or 90d)",
                other
            ))),
        }
    }
}

/// Dashboard figures for one range
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub range: AnalyticsRange,
    pub summary: AnalyticsSummary,
    pub fill_rate: Option<f64>,
    pub active_ratio: Option<f64>,
    pub sms_delivery_rate: Option<f64>,
}

fn ratio(numerator: u32, denominator: u32) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

impl AnalyticsReport {
    pub fn from_summary(range: AnalyticsRange, summary: AnalyticsSummary) -> Self {
        Self {
            range,
            fill_rate: ratio(summary.filled_shifts, summary.total_shifts),
            active_ratio: ratio(summary.active_volunteers, summary.total_volunteers),
            sms_delivery_rate: ratio(summary.sms_delivered, summary.sms_sent),
            summary,
        }
    }

    pub async fn fetch(api: &ApiClient, range: AnalyticsRange) -> ApiResult<Self> {
        let summary = api.analytics_summary(range.as_str()).await?;
        Ok(Self::from_summary(range, summary))
    }

    pub fn unfilled_shifts(&self) -> u32 {
        self.summary.total_shifts.saturating_sub(self.summary.filled_shifts)
    }
}

/// Percentage with one decimal, `n/a` when undefined
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}
