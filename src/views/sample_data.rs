//! Sample-data manager

use crate::api::{ApiClient, ApiError, ApiResult, SampleDataStatus};

#[derive(Debug, Clone, Default)]
pub struct SampleDataManager {
    status: Option<SampleDataStatus>,
}

impl SampleDataManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<&SampleDataStatus> {
        self.status.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.loaded)
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> ApiResult<&SampleDataStatus> {
        let status = api.sample_data_status().await?;
        Ok(self.status.insert(status))
    }

    /// Generate sample people, teams and events; refuses when already loaded
    pub async fn generate(&mut self, api: &ApiClient) -> ApiResult<&SampleDataStatus> {
        if self.is_loaded() {
            return Err(ApiError::Validation("Sample data is already loaded".to_string()));
        }
        let status = api.generate_sample_data().await?;
        tracing::info!(people = status.people, teams = status.teams, events = status.events, "Sample data generated");
        Ok(self.status.insert(status))
    }

    /// Remove every sample record
    pub async fn clear(&mut self, api: &ApiClient) -> ApiResult<()> {
        api.clear_sample_data().await?;
        self.status = Some(SampleDataStatus::default());
        tracing::info!("Sample data cleared");
        Ok(())
    }

    pub fn summary(&self) -> String {
        match &self.status {
            Some(s) if s.loaded => format!(
                "Sample data loaded: {} people, {} teams, {} events",
                s.people, s.teams, s.events
            ),
            Some(_) => "No sample data loaded".to_string(),
            None => "Sample data status unknown".to_string(),
        }
    }
}
