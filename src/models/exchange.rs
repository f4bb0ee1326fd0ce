use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CurrencyInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Completed,
    Canceled,
}

/// Instant swap between two of the user's wallets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyExchange {
    pub id: i64,
    pub uid: String,
    pub from_currency_id: i64,
    pub to_currency_id: i64,
    pub from_currency: CurrencyInfo,
    pub to_currency: CurrencyInfo,
    pub from_amount: f64,
    pub to_amount: f64,
    /// Amount actually credited after the fee
    pub to_amount_with_fee: f64,
    pub exchange_rate: f64,
    pub fee: f64,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCurrencyExchange {
    #[serde(flatten)]
    pub exchange: CurrencyExchange,
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateExchangeRequest {
    pub from_currency_code: String,
    pub to_currency_code: String,
    pub from_amount: f64,
}

/// Result of creating an exchange; currencies are referenced by id only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedExchange {
    pub id: i64,
    pub uid: String,
    pub user_id: i64,
    pub from_currency_id: i64,
    pub to_currency_id: i64,
    pub from_amount: f64,
    pub to_amount: f64,
    pub to_amount_with_fee: f64,
    pub exchange_rate: f64,
    pub fee: f64,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeList {
    pub exchanges: Vec<CurrencyExchange>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminExchangeList {
    pub exchanges: Vec<AdminCurrencyExchange>,
    pub total: u64,
}
