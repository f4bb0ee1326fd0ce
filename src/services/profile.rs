use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::User;

/// Editable profile fields; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChanged {
    #[serde(default)]
    pub message: String,
}

/// The signed-in user's own profile
///
/// These endpoints answer with the bare object, not the usual envelope.
pub struct ProfileService {
    client: Arc<ApiClient>,
}

impl ProfileService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> Result<User> {
        self.client.get("/user/profile").await
    }

    /// Update the profile and refresh the cached user
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let user: User = self
            .client
            .send_json(ApiRequest::put("/user/profile").json(update)?)
            .await?;
        self.client.store().set_user(user.clone());
        Ok(user)
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<PasswordChanged> {
        self.client.put("/user/password", change).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_update_omits_unset_fields() {
        let update = ProfileUpdate {
            phone: Some("+1 555 0100".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"phone": "+1 555 0100"})
        );
    }
}
