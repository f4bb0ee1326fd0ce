use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::CurrencyPair;

#[derive(Debug, Clone, Serialize)]
pub struct CreateRateRequest {
    pub from_currency_id: i64,
    pub to_currency_id: i64,
    pub rate: f64,
    pub fee: f64,
}

#[derive(Debug, Clone, Serialize)]
struct UpdateRateRequest {
    fee: f64,
}

/// Exchange rate administration
pub struct ExchangeRateService {
    client: Arc<ApiClient>,
}

impl ExchangeRateService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<CurrencyPair>> {
        self.client
            .send_data(ApiRequest::get("/admin/exchange-rates"))
            .await
    }

    pub async fn get(&self, rate_id: i64) -> Result<CurrencyPair> {
        self.client
            .send_data(ApiRequest::get(format!("/admin/exchange-rates/{}", rate_id)))
            .await
    }

    pub async fn create(&self, request: &CreateRateRequest) -> Result<CurrencyPair> {
        self.client
            .send_data(ApiRequest::post("/admin/exchange-rates").json(request)?)
            .await
    }

    /// Only the fee is editable; the rate itself comes from the backend
    pub async fn update_fee(&self, rate_id: i64, fee: f64) -> Result<CurrencyPair> {
        let request = ApiRequest::put(format!("/admin/exchange-rates/{}", rate_id))
            .json(&UpdateRateRequest { fee })?;
        self.client.send_data(request).await
    }

    pub async fn delete(&self, rate_id: i64) -> Result<()> {
        self.client
            .send(ApiRequest::delete(format!("/admin/exchange-rates/{}", rate_id)))
            .await
    }
}
