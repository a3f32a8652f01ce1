//! People and team endpoints

use super::{ApiClient, ApiResult, Person, PersonInput, Team, TeamInput};

impl ApiClient {
    pub async fn list_people(&self) -> ApiResult<Vec<Person>> {
        self.get("/api/people").await
    }

    pub async fn get_person(&self, id: i64) -> ApiResult<Person> {
        self.get(&format!("/api/people/{}", id)).await
    }

    pub async fn create_person(&self, input: &PersonInput) -> ApiResult<Person> {
        self.post("/api/people", input).await
    }

    pub async fn update_person(&self, id: i64, input: &PersonInput) -> ApiResult<Person> {
        self.put(&format!("/api/people/{}", id), input).await
    }

    pub async fn delete_person(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/people/{}", id)).await
    }

    pub async fn list_teams(&self) -> ApiResult<Vec<Team>> {
        self.get("/api/teams").await
    }

    pub async fn create_team(&self, input: &TeamInput) -> ApiResult<Team> {
        self.post("/api/teams", input).await
    }

    pub async fn update_team(&self, id: i64, input: &TeamInput) -> ApiResult<Team> {
        self.put(&format!("/api/teams/{}", id), input).await
    }

    pub async fn delete_team(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/teams/{}", id)).await
    }

    /// Members of one team
    pub async fn team_members(&self, team_id: i64) -> ApiResult<Vec<Person>> {
        self.get(&format!("/api/teams/{}/members", team_id)).await
    }
}
