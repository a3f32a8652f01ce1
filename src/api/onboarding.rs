//! Onboarding and sample-data endpoints

use super::{ApiClient, ApiResult, OnboardingProgress, SampleDataStatus};

impl ApiClient {
    pub async fn get_onboarding_progress(&self) -> ApiResult<OnboardingProgress> {
        self.get("/api/onboarding/progress").await
    }

    pub async fn save_onboarding_progress(
        &self,
        progress: &OnboardingProgress,
    ) -> ApiResult<OnboardingProgress> {
        self.patch("/api/onboarding/progress", progress).await
    }

    pub async fn sample_data_status(&self) -> ApiResult<SampleDataStatus> {
        self.get("/api/onboarding/sample-data").await
    }

    pub async fn generate_sample_data(&self) -> ApiResult<SampleDataStatus> {
        self.post("/api/onboarding/sample-data", &()).await
    }

    pub async fn clear_sample_data(&self) -> ApiResult<()> {
        self.delete("/api/onboarding/sample-data").await
    }
}
