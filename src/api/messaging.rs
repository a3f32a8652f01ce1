//! SMS broadcast and invitation endpoints

use super::{
    ApiClient, ApiResult, Broadcast, BroadcastRequest, BroadcastResult, Invitation,
    InvitationRequest, Person,
};

impl ApiClient {
    /// People who can be picked as broadcast recipients
    pub async fn list_sms_recipients(&self) -> ApiResult<Vec<Person>> {
        self.get("/api/sms/recipients").await
    }

    pub async fn send_broadcast(&self, request: &BroadcastRequest) -> ApiResult<BroadcastResult> {
        self.post("/api/sms/broadcasts", request).await
    }

    pub async fn list_broadcasts(&self) -> ApiResult<Vec<Broadcast>> {
        self.get("/api/sms/broadcasts").await
    }

    pub async fn list_invitations(&self) -> ApiResult<Vec<Invitation>> {
        self.get("/api/invitations").await
    }

    pub async fn send_invitation(&self, request: &InvitationRequest) -> ApiResult<Invitation> {
        self.post("/api/invitations", request).await
    }

    pub async fn resend_invitation(&self, id: i64) -> ApiResult<Invitation> {
        self.post(&format!("/api/invitations/{}/resend", id), &()).await
    }

    pub async fn revoke_invitation(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/invitations/{}", id)).await
    }
}
