use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::{Transaction, TransactionStatus, TransactionType};

/// Filters for the history endpoint; unset fields are omitted
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryQuery {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

pub struct TransactionService {
    client: Arc<ApiClient>,
}

impl TransactionService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Transaction history, newest first as ordered by the backend
    pub async fn history(&self, query: &HistoryQuery) -> Result<Vec<Transaction>> {
        // This endpoint returns a bare array, not an envelope
        let request = ApiRequest::get("/transactions/history").query(query)?;
        self.client.send_json(request).await
    }
}
