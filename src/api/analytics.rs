//! Admin analytics endpoint

use super::{ApiClient, ApiResult, AnalyticsSummary};

impl ApiClient {
    /// Summary for a range such as `7d`, `30d` or `90d`
    pub async fn analytics_summary(&self, range: &str) -> ApiResult<AnalyticsSummary> {
        self.get(&format!(
            "/api/admin/analytics?range={}",
            urlencoding::encode(range)
        ))
        .await
    }
}
