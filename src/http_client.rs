use anyhow::Context;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::refresh::{self, RefreshCoordinator, RefreshTicket};
use crate::auth::types::{is_refresh_path, Credentials, LogoutRequest, LOGOUT_PATH};
use crate::auth::{CredentialStore, LoginRedirect};
use crate::error::{ApiError, Result};
use crate::models::Envelope;

/// Connection settings for [`ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Backend base URL, e.g. `http://localhost:8080/api/v1`
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applied to every request, retries included
    pub request_timeout: Duration,
    /// Upper bound on a token refresh call
    pub refresh_timeout: Duration,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(15),
        }
    }
}

/// One backend call, rebuilt for every attempt
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    public: bool,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };

        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
            public: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Send without credentials and skip 401 recovery
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).context("Failed to serialize request body")?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append query parameters from a serializable struct or map
    ///
    /// `null` fields are skipped; non-string scalars are rendered as JSON.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        let value = serde_json::to_value(query).context("Failed to serialize query")?;
        let serde_json::Value::Object(map) = value else {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "Query parameters must serialize to an object"
            )));
        };

        for (key, value) in map {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => self.query.push((key, s)),
                other => self.query.push((key, other.to_string())),
            }
        }
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Whether this request has already been retried after a refresh
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// HTTP client for the exchange backend with transparent token refresh
///
/// Attaches the stored access token to every request. A 401 triggers at most
/// one refresh at a time; requests failing while it runs wait for its token
/// and are each retried once.
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base URL without trailing slash
    base_url: String,

    store: Arc<CredentialStore>,

    redirect: Arc<dyn LoginRedirect>,

    /// Single-flight refresh state owned by this client
    refresh: RefreshCoordinator,

    refresh_timeout: Duration,
}

impl ApiClient {
    /// Create a new HTTP client
    pub fn new(
        options: ClientOptions,
        store: Arc<CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            store,
            redirect,
            refresh: RefreshCoordinator::new(),
            refresh_timeout: options.refresh_timeout,
        })
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a token refresh is currently running
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Requests waiting for the running refresh
    pub fn queued_requests(&self) -> usize {
        self.refresh.queued()
    }

    /// Execute a request, recovering from an expired access token
    ///
    /// Returns the successful response; every non-2xx outcome becomes an
    /// [`ApiError`].
    pub async fn execute(&self, request: ApiRequest) -> Result<Response> {
        let token = if request.public {
            None
        } else {
            self.store.access_token()
        };

        let response = self.dispatch(&request, token.as_deref()).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && !request.public {
            let error = ApiError::from_response(response).await;
            return self.recover_unauthorized(request, token, error).await;
        }

        Err(self.reject(&request, response).await)
    }

    /// Execute and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        decode(response).await
    }

    /// Execute and unwrap the `{"success", "data"}` envelope
    pub async fn send_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let envelope: Envelope<T> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Execute and discard the body
    pub async fn send(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::delete(path)).await
    }

    /// Notify the backend best-effort, then clear local credentials
    pub async fn logout(&self) {
        let creds = self.store.credentials();
        self.notify_logout(&creds).await;

        self.store.clear();
        tracing::info!("Logged out");
    }

    /// Tell the backend to revoke `creds`; failures are only logged
    async fn notify_logout(&self, creds: &Credentials) {
        if let Some(ref refresh_token) = creds.refresh_token {
            let notify = ApiRequest::post(LOGOUT_PATH).json(&LogoutRequest { refresh_token });
            match notify {
                Ok(request) => match self.dispatch(&request, creds.access_token.as_deref()).await {
                    Ok(response) if response.status().is_success() => {
                        tracing::debug!("Backend acknowledged logout");
                    }
                    Ok(response) => {
                        tracing::warn!(status = %response.status(), "Backend rejected logout");
                    }
                    Err(e) => {
                        tracing::warn!("Logout notification failed: {}", e);
                    }
                },
                Err(e) => tracing::warn!("Failed to build logout request: {}", e),
            }
        }
    }

    /// Handle a 401 for a request sent with `used_token`
    async fn recover_unauthorized(
        &self,
        mut request: ApiRequest,
        used_token: Option<String>,
        error: ApiError,
    ) -> Result<Response> {
        if request.retried {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                "Received 401 after refresh, giving up"
            );
            return Err(error);
        }

        let creds = self.store.credentials();
        let refresh_token = match creds.refresh_token {
            Some(ref refresh_token) if creds.is_complete() => refresh_token.clone(),
            _ if used_token.is_some() && creds.access_token.is_none() => {
                // Whoever cleared the store has already redirected
                tracing::debug!(
                    path = %request.path,
                    "Received 401 after the session ended"
                );
                return Err(error);
            }
            _ => {
                tracing::warn!(
                    path = %request.path,
                    "Received 401 without stored credentials, clearing session"
                );
                self.store.clear();
                self.redirect.redirect_to_login();
                return Err(error);
            }
        };

        if is_refresh_path(&request.path) {
            tracing::warn!("Refresh token rejected, logging out");
            let creds = self.end_session();
            self.notify_logout(&creds).await;
            return Err(error);
        }

        request.retried = true;

        let ticket = self
            .refresh
            .join(used_token.as_deref(), || self.store.access_token());

        match ticket {
            RefreshTicket::Refreshed(token) => {
                tracing::debug!(path = %request.path, "Token already refreshed, retrying");
                self.retry(request, &token).await
            }
            RefreshTicket::SignedOut => {
                tracing::debug!(
                    path = %request.path,
                    "Session ended before the refresh could start"
                );
                Err(error)
            }
            RefreshTicket::Queued(waiter) => {
                tracing::debug!(
                    path = %request.path,
                    "Token refresh in flight, queueing request"
                );
                let token = waiter.await.map_err(|_| ApiError::RefreshAbandoned)?;
                self.retry(request, &token).await
            }
            RefreshTicket::Leader(lease) => {
                tracing::warn!(path = %request.path, "Received 401, refreshing token and retrying...");

                let refreshed = refresh::request_access_token(
                    &self.client,
                    &self.base_url,
                    &refresh_token,
                    self.refresh_timeout,
                )
                .await;

                match refreshed {
                    Ok(token) => {
                        // Store first: late 401s compare against the stored token
                        self.store.set_access_token(&token);
                        lease.resolve(&token);
                        self.retry(request, &token).await
                    }
                    Err(e) => {
                        // The store must be empty before the refresh is released,
                        // or a late 401 could lead a second refresh
                        let creds = self.end_session();
                        lease.abandon();

                        self.notify_logout(&creds).await;
                        tracing::info!("Logged out after failed token refresh");
                        Err(e)
                    }
                }
            }
        }
    }

    /// Clear local credentials and send the user to login, returning what was cleared
    fn end_session(&self) -> Credentials {
        let creds = self.store.credentials();
        self.store.clear();
        self.redirect.redirect_to_login();
        creds
    }

    /// Second and final attempt with a refreshed token
    async fn retry(&self, request: ApiRequest, token: &str) -> Result<Response> {
        let response = self.dispatch(&request, Some(token)).await?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.reject(&request, response).await)
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, request.path);

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authenticated = token.is_some(),
            retried = request.retried,
            "Sending API request"
        );

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        match builder.send().await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Received API response");
                Ok(response)
            }
            Err(e) => {
                // Categorize the error for better debugging
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else {
                    "unknown"
                };

                tracing::error!(
                    error_kind = error_kind,
                    error = %e,
                    method = %request.method,
                    path = %request.path,
                    "Network error"
                );
                Err(ApiError::Network(e))
            }
        }
    }

    /// Turn a non-success response into an error, logging it
    async fn reject(&self, request: &ApiRequest, response: Response) -> ApiError {
        let error = ApiError::from_response(response).await;

        match error {
            ApiError::Forbidden(ref message) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    "Access forbidden: {}",
                    message
                );
            }
            ref other => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    status = ?other.status(),
                    "Request failed: {}",
                    other
                );
            }
        }

        error
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(ApiError::Network)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
