//! Solver solutions list

use chrono::{DateTime, Local, NaiveDate, Utc};

use super::unlocks::{Feature, FeatureUnlocks};
use crate::api::{ApiClient, ApiError, ApiResult, Solution, SolutionStatus, SolverRunRequest};

/// Result of asking the solver for a new schedule
#[derive(Debug, Clone)]
pub struct SolverRunOutcome {
    pub solution: Solution,
    pub newly_unlocked: Vec<Feature>,
}

/// Loaded solutions and the active filter
#[derive(Debug, Clone, Default)]
pub struct SolutionsState {
    solutions: Vec<Solution>,
    filter: Option<SolutionStatus>,
    loaded_at: Option<DateTime<Utc>>,
}

impl SolutionsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, api: &ApiClient) -> ApiResult<()> {
        let solutions = api.list_solutions().await?;
        self.set_solutions(solutions);
        Ok(())
    }

    /// Replace the list, newest first
    pub fn set_solutions(&mut self, mut solutions: Vec<Solution>) {
        solutions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        self.solutions = solutions;
        self.loaded_at = Some(Utc::now());
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn set_filter(&mut self, status: Option<SolutionStatus>) {
        self.filter = status;
    }

    pub fn filter(&self) -> Option<SolutionStatus> {
        self.filter
    }

    /// Solutions passing the filter
    pub fn visible(&self) -> Vec<&Solution> {
        self.solutions
            .iter()
            .filter(|s| self.filter.map_or(true, |status| s.status == status))
            .collect()
    }

    pub fn all(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn latest_completed(&self) -> Option<&Solution> {
        self.solutions
            .iter()
            .find(|s| s.status == SolutionStatus::Completed)
    }

    /// Start a solver run and count it toward feature unlocks
    pub async fn run_solver(
        &mut self,
        api: &ApiClient,
        unlocks: &FeatureUnlocks,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ApiResult<SolverRunOutcome> {
        if end_date < start_date {
            return Err(ApiError::Validation(
                "End date must not be before start date".to_string(),
            ));
        }

        let solution = api
            .run_solver(&SolverRunRequest {
                start_date,
                end_date,
            })
            .await?;
        tracing::info!(solution_id = solution.id, "Solver run started");

        // Bookkeeping failures do not fail the run
        let newly_unlocked = match unlocks.record_solver_run(Local::now().date_naive()) {
            Ok(features) => features,
            Err(e) => {
                tracing::warn!("Could not record solver run: {}", e);
                Vec::new()
            }
        };

        let mut solutions = std::mem::take(&mut self.solutions);
        solutions.retain(|s| s.id != solution.id);
        solutions.push(solution.clone());
        self.set_solutions(solutions);

        Ok(SolverRunOutcome {
            solution,
            newly_unlocked,
        })
    }

    pub async fn publish(&mut self, api: &ApiClient, id: i64) -> ApiResult<Solution> {
        let published = api.publish_solution(id).await?;
        if let Some(slot) = self.solutions.iter_mut().find(|s| s.id == id) {
            *slot = published.clone();
        }
        Ok(published)
    }

    pub async fn delete(&mut self, api: &ApiClient, id: i64) -> ApiResult<()> {
        api.delete_solution(id).await?;
        self.solutions.retain(|s| s.id != id);
        Ok(())
    }
}
