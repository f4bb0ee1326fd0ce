use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, ApiRequest};
use crate::models::{CurrencyInfo, Transaction, Wallet};

#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawRequest {
    pub currency: String,
    pub amount: f64,
    pub address: String,
}

/// Result of a deposit or withdrawal, with the updated wallets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletOperation {
    #[serde(default)]
    pub success: bool,
    pub transaction: Transaction,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
}

pub struct WalletService {
    client: Arc<ApiClient>,
}

impl WalletService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Currencies a wallet can hold
    pub async fn currencies(&self) -> Result<Vec<CurrencyInfo>> {
        self.client
            .send_data(ApiRequest::get("/wallet/currencies"))
            .await
    }

    pub async fn wallets(&self) -> Result<Vec<Wallet>> {
        self.client.send_data(ApiRequest::get("/wallets")).await
    }

    pub async fn deposit(&self, request: &DepositRequest) -> Result<WalletOperation> {
        self.client.post("/wallets/deposit", request).await
    }

    pub async fn withdraw(&self, request: &WithdrawRequest) -> Result<WalletOperation> {
        self.client.post("/wallets/withdraw", request).await
    }
}
