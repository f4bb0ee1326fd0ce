use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::{User, Wallet};

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_blocked: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub user: User,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
}

/// Admin credit of a user's wallet
#[derive(Debug, Clone, Serialize)]
pub struct ManualDepositRequest {
    pub user_id: i64,
    pub currency_code: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualDeposit {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub wallet: Wallet,
}

pub struct AdminUserService {
    client: Arc<ApiClient>,
}

impl AdminUserService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<UserList> {
        self.client
            .send_data(ApiRequest::get("/admin/users").query(query)?)
            .await
    }

    /// User with all of their wallets
    pub async fn get(&self, user_id: i64) -> Result<UserDetail> {
        self.client
            .send_data(ApiRequest::get(format!("/admin/users/{}", user_id)))
            .await
    }

    pub async fn manual_deposit(&self, request: &ManualDepositRequest) -> Result<ManualDeposit> {
        self.client.post("/admin/wallets/deposit", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_query_omits_unset_filters() {
        let request = ApiRequest::get("/admin/users")
            .query(&UserQuery {
                email: None,
                is_blocked: Some(true),
            })
            .unwrap();
        assert_eq!(
            request.query_pairs(),
            &[("is_blocked".to_string(), "true".to_string())]
        );
    }
}
