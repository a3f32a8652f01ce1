//! Authentication endpoints
//!
//! Login, signup and token flows run without a bearer token; their 401s are
//! ordinary failures and never touch the stored session.

use serde::Serialize;

use super::{
    AcceptInvitationRequest, ApiClient, ApiResult, AuthResponse, InvitationDetails, LoginRequest,
    ResetTokenStatus, SignupRequest,
};
use crate::session::{Session, User};

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordBody<'a> {
    token: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Log in and store the resulting session
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.public_post("/api/auth/login", &body).await?;
        self.start_session(response)
    }

    /// Create an account and organization, then store the session
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<Session> {
        let response: AuthResponse = self.public_post("/api/auth/signup", request).await?;
        self.start_session(response)
    }

    /// End the session on the backend and locally.
    ///
    /// The local session is cleared even if the backend call fails.
    pub async fn logout(&self) -> ApiResult<()> {
        if self.session().is_loaded() {
            if let Err(e) = self.post_no_content("/api/auth/logout", &()).await {
                tracing::warn!("Logout request failed: {}", e);
            }
        }
        self.session().clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Current user as seen by the backend
    pub async fn me(&self) -> ApiResult<User> {
        self.get("/api/auth/me").await
    }

    /// Check an invitation token from an invitation link
    pub async fn validate_invitation(&self, token: &str) -> ApiResult<InvitationDetails> {
        self.public_get(&format!(
            "/api/invitations/validate?token={}",
            urlencoding::encode(token)
        ))
        .await
    }

    /// Accept an invitation, creating the account and session
    pub async fn accept_invitation(&self, request: &AcceptInvitationRequest) -> ApiResult<Session> {
        let response: AuthResponse = self.public_post("/api/invitations/accept", request).await?;
        self.start_session(response)
    }

    /// Check a password-reset token from a reset link
    pub async fn validate_reset_token(&self, token: &str) -> ApiResult<ResetTokenStatus> {
        self.public_get(&format!(
            "/api/auth/reset-password/validate?token={}",
            urlencoding::encode(token)
        ))
        .await
    }

    /// Ask for a password-reset e-mail
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let _: serde_json::Value = self
            .public_post("/api/auth/forgot-password", &EmailBody { email })
            .await?;
        Ok(())
    }

    /// Set a new password with a reset token
    pub async fn reset_password(&self, token: &str, password: &str) -> ApiResult<()> {
        let _: serde_json::Value = self
            .public_post("/api/auth/reset-password", &ResetPasswordBody { token, password })
            .await?;
        Ok(())
    }

    fn start_session(&self, response: AuthResponse) -> ApiResult<Session> {
        let session = Session {
            user: response.user,
            org: response.organization,
            auth_token: response.token,
        };
        self.session().login(session.clone())?;
        Ok(session)
    }
}
