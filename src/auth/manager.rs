use std::sync::Arc;

use super::store::CredentialStore;
use super::types::{AuthSession, LoginRequest, RegisterRequest, LOGIN_PATH, ME_PATH, REGISTER_PATH};
use crate::error::{ErrorKind, Result};
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::user::{User, UserPatch};

/// Authentication manager
/// Session lifecycle on top of the shared API client and credential store
pub struct AuthManager {
    client: Arc<ApiClient>,
}

impl AuthManager {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn store(&self) -> &CredentialStore {
        self.client.store()
    }

    /// Sign in and persist the new session
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<User> {
        tracing::debug!(email = %email, remember_me, "Logging in");

        // Credential exchange never goes through 401 recovery
        let request = ApiRequest::post(LOGIN_PATH)
            .public()
            .json(&LoginRequest {
                email,
                password,
                remember_me,
            })?;
        let session: AuthSession = self.client.send_data(request).await?;

        Ok(self.start_session(session))
    }

    /// Create an account and persist the new session
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User> {
        tracing::debug!(email = %registration.email, "Registering account");

        let request = ApiRequest::post(REGISTER_PATH).public().json(registration)?;
        let session: AuthSession = self.client.send_data(request).await?;

        Ok(self.start_session(session))
    }

    fn start_session(&self, session: AuthSession) -> User {
        let user = session.user.clone();
        self.store().set_session(session);
        tracing::info!(user_id = user.id, "Session started");
        user
    }

    /// Best-effort backend logout; local state is always cleared
    pub async fn logout(&self) {
        self.client.logout().await;
    }

    /// Fetch the signed-in user
    pub async fn current_user(&self) -> Result<User> {
        self.client.send_data(ApiRequest::get(ME_PATH)).await
    }

    /// Validate the stored session against the backend
    ///
    /// Returns `Ok(None)` when there is no session or the backend no longer
    /// accepts it (local state is cleared in that case). Connectivity
    /// failures are returned as errors and leave the session untouched.
    pub async fn check_auth(&self) -> Result<Option<User>> {
        if self.store().access_token().is_none() {
            return Ok(None);
        }

        match self.current_user().await {
            Ok(user) => {
                self.store().set_user(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.kind() == ErrorKind::Connectivity => Err(e),
            Err(e) => {
                tracing::warn!("Stored session rejected: {}", e);
                self.store().clear();
                Ok(None)
            }
        }
    }

    /// Merge local profile edits into the stored user
    pub fn update_user(&self, patch: UserPatch) {
        self.store().update_user(patch);
    }

    /// User cached in the credential store
    pub fn cached_user(&self) -> Option<User> {
        self.store().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().is_authenticated()
    }
}
