//! Billing portal
//!
//! Plans and the subscription come from the backend; checkout and the
//! provider's self-service portal are external URLs handed back to the caller.

use crate::api::{ApiClient, ApiError, ApiResult, Plan, Subscription};

/// Seat usage against the plan limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeatUsage {
    pub used: u32,
    pub limit: Option<u32>,
}

impl SeatUsage {
    /// Fraction of seats used, `None` on unlimited plans
    pub fn ratio(&self) -> Option<f64> {
        match self.limit {
            Some(0) => Some(1.0),
            Some(limit) => Some(self.used as f64 / limit as f64),
            None => None,
        }
    }

    pub fn is_over_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.used > limit)
    }

    /// At or above 90 percent of the limit
    pub fn is_near_limit(&self) -> bool {
        self.ratio().is_some_and(|r| r >= 0.9)
    }

    pub fn label(&self) -> String {
        match self.limit {
            Some(limit) => format!("{} of {} volunteers", self.used, limit),
            None => format!("{} volunteers (unlimited)", self.used),
        }
    }
}

/// Price in cents as `$12.00/month`
pub fn format_price(cents: i64, interval: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}/{}", sign, abs / 100, abs % 100, interval)
}

/// Billing screen state
#[derive(Debug, Clone, Default)]
pub struct BillingState {
    pub plans: Vec<Plan>,
    pub subscription: Option<Subscription>,
}

impl BillingState {
    pub async fn load(&mut self, api: &ApiClient) -> ApiResult<()> {
        let mut plans = api.list_plans().await?;
        plans.sort_by_key(|p| p.price_cents);
        self.plans = plans;
        self.subscription = Some(api.get_subscription().await?);
        Ok(())
    }

    pub fn current_plan(&self) -> Option<&Plan> {
        let plan_id = self.subscription.as_ref()?.plan_id.as_deref()?;
        self.plans.iter().find(|p| p.id == plan_id)
    }

    pub fn seat_usage(&self) -> Option<SeatUsage> {
        let subscription = self.subscription.as_ref()?;
        let limit = subscription
            .volunteer_limit
            .or_else(|| self.current_plan().and_then(|p| p.volunteer_limit));
        Some(SeatUsage {
            used: subscription.volunteer_count,
            limit,
        })
    }

    /// Plans that fit the current volunteer count
    pub fn eligible_plans(&self) -> Vec<&Plan> {
        let used = self
            .subscription
            .as_ref()
            .map(|s| s.volunteer_count)
            .unwrap_or(0);
        self.plans
            .iter()
            .filter(|p| p.volunteer_limit.map_or(true, |limit| used <= limit))
            .collect()
    }

    /// Checkout URL for switching to `plan_id`
    pub async fn checkout(&self, api: &ApiClient, plan_id: &str) -> ApiResult<String> {
        if !self.plans.is_empty() && !self.plans.iter().any(|p| p.id == plan_id) {
            return Err(ApiError::Validation(format!("Unknown plan: {}", plan_id)));
        }
        if self.current_plan().is_some_and(|p| p.id == plan_id) {
            return Err(ApiError::Validation("Already on this plan".to_string()));
        }
        let redirect = api.create_checkout(plan_id).await?;
        tracing::info!(plan_id, "Checkout session created");
        Ok(redirect.url)
    }

    /// URL of the provider's self-service portal
    pub async fn portal(&self, api: &ApiClient) -> ApiResult<String> {
        Ok(api.create_portal_session().await?.url)
    }
}
