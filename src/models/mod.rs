// Data models for the exchange backend

pub mod currency;
pub mod exchange;
pub mod user;
pub mod wallet;

use serde::{Deserialize, Serialize};

pub use currency::{CurrencyInfo, CurrencyPair};
pub use exchange::{AdminCurrencyExchange, CurrencyExchange, ExchangeStatus};
pub use user::User;
pub use wallet::{Transaction, TransactionStatus, TransactionType, Wallet};

/// Standard backend response envelope: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

/// Bare acknowledgement: `{"success": true}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
