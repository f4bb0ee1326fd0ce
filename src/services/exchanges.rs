use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::exchange::{
    AdminCurrencyExchange, AdminExchangeList, CreateExchangeRequest, CreatedExchange,
    CurrencyExchange, ExchangeList,
};
use crate::models::{Ack, CurrencyPair};

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_ADMIN_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Serialize)]
struct Page {
    limit: u32,
    offset: u32,
}

/// Admin listing filters
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminExchangeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct ExchangeService {
    client: Arc<ApiClient>,
}

impl ExchangeService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Available currency pairs; public, sent without credentials
    pub async fn pairs(&self) -> Result<Vec<CurrencyPair>> {
        self.client
            .send_data(ApiRequest::get("/exchange-rates").public())
            .await
    }

    /// Instant swap between two of the user's wallets
    pub async fn create(&self, request: &CreateExchangeRequest) -> Result<CreatedExchange> {
        self.client
            .send_data(ApiRequest::post("/exchanges").json(request)?)
            .await
    }

    /// The user's exchanges, `limit` defaults to 10
    pub async fn list(&self, limit: Option<u32>, offset: Option<u32>) -> Result<ExchangeList> {
        let page = Page {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        };
        self.client
            .send_data(ApiRequest::get("/exchanges").query(&page)?)
            .await
    }

    pub async fn get(&self, exchange_id: i64) -> Result<CurrencyExchange> {
        self.client
            .send_data(ApiRequest::get(format!("/exchanges/{}", exchange_id)))
            .await
    }

    /// Cancel an exchange; the backend only allows this while it is pending
    pub async fn cancel(&self, exchange_id: i64) -> Result<Ack> {
        self.client
            .delete(&format!("/exchanges/{}", exchange_id))
            .await
    }

    /// All users' exchanges (admin), `limit` defaults to 50
    pub async fn list_all(&self, query: &AdminExchangeQuery) -> Result<AdminExchangeList> {
        let query = AdminExchangeQuery {
            limit: Some(query.limit.unwrap_or(DEFAULT_ADMIN_PAGE_SIZE)),
            offset: Some(query.offset.unwrap_or(0)),
            ..query.clone()
        };
        self.client
            .send_data(ApiRequest::get("/admin/exchanges").query(&query)?)
            .await
    }

    pub async fn get_admin(&self, exchange_id: i64) -> Result<AdminCurrencyExchange> {
        self.client
            .send_data(ApiRequest::get(format!("/admin/exchanges/{}", exchange_id)))
            .await
    }
}
