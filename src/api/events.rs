//! Event and recurring-series endpoints

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ApiClient, ApiResult, Event, NewEvent};
use crate::recurrence::{
    EventSink, NewSeries, PreviewRequest, PreviewResponse, PreviewSource, RecurringSeries,
};

impl ApiClient {
    /// Events overlapping a time range
    pub async fn list_events(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<Event>> {
        let mut params = Vec::new();
        if let Some(from) = from {
            params.push(format!("from={}", urlencoding::encode(&from.to_rfc3339())));
        }
        if let Some(to) = to {
            params.push(format!("to={}", urlencoding::encode(&to.to_rfc3339())));
        }

        let path = if params.is_empty() {
            "/api/events".to_string()
        } else {
            format!("/api/events?{}", params.join("&"))
        };
        self.get(&path).await
    }

    pub async fn get_event(&self, id: i64) -> ApiResult<Event> {
        self.get(&format!("/api/events/{}", id)).await
    }

    pub async fn create_event(&self, event: &NewEvent) -> ApiResult<Event> {
        self.post("/api/events", event).await
    }

    pub async fn update_event(&self, id: i64, event: &NewEvent) -> ApiResult<Event> {
        self.put(&format!("/api/events/{}", id), event).await
    }

    pub async fn delete_event(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/events/{}", id)).await
    }

    /// Ask the backend to expand a pattern without saving it
    pub async fn preview_recurring(&self, request: &PreviewRequest) -> ApiResult<PreviewResponse> {
        self.post("/api/recurring-series/preview", request).await
    }

    /// Save a series and its occurrences on the backend
    pub async fn create_recurring_series(&self, series: &NewSeries) -> ApiResult<RecurringSeries> {
        self.post("/api/recurring-series", series).await
    }

    pub async fn delete_recurring_series(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/recurring-series/{}", id)).await
    }
}

#[async_trait]
impl EventSink for ApiClient {
    async fn create_event(&self, event: &NewEvent) -> ApiResult<Event> {
        ApiClient::create_event(self, event).await
    }
}

#[async_trait]
impl PreviewSource for ApiClient {
    async fn preview(&self, request: &PreviewRequest) -> ApiResult<PreviewResponse> {
        self.preview_recurring(request).await
    }
}
