// Token refresh: single-flight coordination and the refresh call itself

use reqwest::Client;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

use super::types::{RefreshRequest, RefreshResponse, REFRESH_PATH};
use crate::error::{ApiError, Result};
use crate::models::Envelope;

/// Continuation of a request waiting for a fresh access token
pub type PendingRequest = Box<dyn FnOnce(&str) + Send>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    queue: VecDeque<PendingRequest>,
}

/// Outcome of trying to take part in a refresh
pub enum Claim<'a> {
    /// No refresh was running; the caller now owns it
    Leader(RefreshLease<'a>),
    /// A refresh is running; the continuation was queued
    Queued,
    /// The rejected token was already replaced by a finished refresh
    Refreshed(String),
    /// The session ended while the request was in flight
    SignedOut,
}

/// Same as [`Claim`], with the queued continuation turned into a receiver
pub enum RefreshTicket<'a> {
    Leader(RefreshLease<'a>),
    Queued(oneshot::Receiver<String>),
    Refreshed(String),
    SignedOut,
}

/// Ensures at most one refresh call is in flight per client
///
/// The in-flight check, the flag update and the enqueue all happen inside one
/// mutex section with no suspension point, so two callers can never both
/// observe "no refresh running".
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        // Continuations never run under the lock, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of requests waiting on the in-flight refresh
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Take the refresh, queue behind it, or skip it if already done
    ///
    /// `rejected` is the access token the failed request was sent with and
    /// `current` reads the token now held by the credential store. The store
    /// is read under the lock; a leader writes the new token before settling,
    /// so a late 401 for an already replaced token never starts a second refresh.
    /// An empty store means a failed refresh already ended the session.
    pub fn claim<F>(&self, rejected: Option<&str>, current: F, pending: PendingRequest) -> Claim<'_>
    where
        F: FnOnce() -> Option<String>,
    {
        let mut state = self.lock();

        if state.in_flight {
            state.queue.push_back(pending);
            return Claim::Queued;
        }

        match current() {
            Some(token) if rejected != Some(token.as_str()) => return Claim::Refreshed(token),
            Some(_) => {}
            None => return Claim::SignedOut,
        }

        state.in_flight = true;
        Claim::Leader(RefreshLease {
            coordinator: self,
            settled: false,
        })
    }

    /// [`claim`](Self::claim) with a oneshot channel as the continuation
    pub fn join<F>(&self, rejected: Option<&str>, current: F) -> RefreshTicket<'_>
    where
        F: FnOnce() -> Option<String>,
    {
        let (tx, rx) = oneshot::channel::<String>();
        let pending: PendingRequest = Box::new(move |token: &str| {
            let _ = tx.send(token.to_string());
        });

        match self.claim(rejected, current, pending) {
            Claim::Leader(lease) => RefreshTicket::Leader(lease),
            Claim::Queued => RefreshTicket::Queued(rx),
            Claim::Refreshed(token) => RefreshTicket::Refreshed(token),
            Claim::SignedOut => RefreshTicket::SignedOut,
        }
    }

    fn settle(&self) -> VecDeque<PendingRequest> {
        let mut state = self.lock();
        state.in_flight = false;
        std::mem::take(&mut state.queue)
    }
}

/// Ownership of the in-flight refresh
///
/// Dropping the lease without [`resolve`](Self::resolve) clears the flag and
/// discards the queue, so every exit path of the leader releases the refresh.
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Release the refresh and hand `token` to every queued request, oldest first
    pub fn resolve(mut self, token: &str) {
        self.settled = true;
        let queue = self.coordinator.settle();

        tracing::debug!(queued = queue.len(), "Dispatching queued requests");
        for pending in queue {
            pending(token);
        }
    }

    /// Release the refresh and reject every queued request
    pub fn abandon(self) {}
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let queue = self.coordinator.settle();
        if !queue.is_empty() {
            tracing::warn!(discarded = queue.len(), "Token refresh failed, discarding queued requests");
        }
    }
}

/// Exchange a refresh token for a new access token
///
/// Any failure, including `timeout` elapsing, is reported as
/// [`ApiError::RefreshFailed`].
pub async fn request_access_token(
    client: &Client,
    base_url: &str,
    refresh_token: &str,
    timeout: Duration,
) -> Result<String> {
    tracing::info!("Refreshing access token...");

    let url = format!("{}{}", base_url, REFRESH_PATH);
    let call = async {
        let response = client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = ApiError::from_response(response).await;
            return Err(ApiError::RefreshFailed(format!("{} - {}", status.as_u16(), reason)));
        }

        let envelope: Envelope<RefreshResponse> = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("invalid response: {}", e)))?;

        if envelope.data.access_token.is_empty() {
            return Err(ApiError::RefreshFailed(
                "response does not contain access_token".to_string(),
            ));
        }

        Ok(envelope.data.access_token)
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(token)) => {
            tracing::info!("Access token refreshed");
            Ok(token)
        }
        Ok(Err(e)) => {
            tracing::error!("Token refresh failed: {}", e);
            Err(e)
        }
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs_f64(), "Token refresh timed out");
            Err(ApiError::RefreshFailed(format!(
                "timed out after {:.1}s",
                timeout.as_secs_f64()
            )))
        }
    }
}
