// Authentication types

use serde::{Deserialize, Serialize};

use crate::models::User;

/// Backend path of the token refresh endpoint
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

/// Token pair as read from the credential store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Both tokens are present, so a refresh can be attempted
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}

/// Session data returned by login and register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// `POST /auth/refresh` request body
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `data` payload of the refresh response
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// `POST /auth/logout` request body
#[derive(Debug, Serialize)]
pub struct LogoutRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

/// Whether a request path targets the refresh endpoint
pub fn is_refresh_path(path: &str) -> bool {
    path.contains(REFRESH_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_request_wire_shape() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "rt_1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"refresh_token": "rt_1"}));
    }

    #[test]
    fn test_register_request_skips_missing_referral() {
        let body = serde_json::to_value(RegisterRequest {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "hunter2".to_string(),
            referral_code: None,
        })
        .unwrap();
        assert!(body.get("referral_code").is_none());
    }

    #[test]
    fn test_is_refresh_path() {
        assert!(is_refresh_path("/auth/refresh"));
        assert!(is_refresh_path("/api/v1/auth/refresh"));
        assert!(!is_refresh_path("/auth/login"));
    }

    #[test]
    fn test_credentials_completeness() {
        let mut creds = Credentials {
            access_token: Some("tok".to_string()),
            refresh_token: None,
        };
        assert!(!creds.is_complete());
        creds.refresh_token = Some("rt".to_string());
        assert!(creds.is_complete());
    }
}
