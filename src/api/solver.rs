//! Schedule solver endpoints

use super::{ApiClient, ApiResult, Solution, SolverRunRequest};

impl ApiClient {
    pub async fn list_solutions(&self) -> ApiResult<Vec<Solution>> {
        self.get("/api/solutions").await
    }

    pub async fn get_solution(&self, id: i64) -> ApiResult<Solution> {
        self.get(&format!("/api/solutions/{}", id)).await
    }

    pub async fn delete_solution(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/solutions/{}", id)).await
    }

    /// Publish a completed solution as the live schedule
    pub async fn publish_solution(&self, id: i64) -> ApiResult<Solution> {
        self.post(&format!("/api/solutions/{}/publish", id), &()).await
    }

    /// Start a solver run; the returned solution is usually still pending
    pub async fn run_solver(&self, request: &SolverRunRequest) -> ApiResult<Solution> {
        self.post("/api/solver/run", request).await
    }
}
