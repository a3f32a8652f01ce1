//! Billing endpoints
//!
//! Checkout and the customer portal are hosted by the payment provider; the
//! backend only hands out redirect URLs.

use serde::Serialize;

use super::{ApiClient, ApiResult, Plan, RedirectUrl, Subscription};

#[derive(Serialize)]
struct CheckoutBody<'a> {
    plan_id: &'a str,
}

impl ApiClient {
    pub async fn list_plans(&self) -> ApiResult<Vec<Plan>> {
        self.get("/api/billing/plans").await
    }

    pub async fn get_subscription(&self) -> ApiResult<Subscription> {
        self.get("/api/billing/subscription").await
    }

    /// Checkout URL for switching to a plan
    pub async fn create_checkout(&self, plan_id: &str) -> ApiResult<RedirectUrl> {
        self.post("/api/billing/checkout", &CheckoutBody { plan_id })
            .await
    }

    /// Customer portal URL for invoices and payment methods
    pub async fn create_portal_session(&self) -> ApiResult<RedirectUrl> {
        self.post("/api/billing/portal", &()).await
    }
}
