use serde::{Deserialize, Serialize};

/// Currency as configured on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_crypto: bool,
    pub is_active: bool,
    #[serde(default)]
    pub symbol: String,
}

/// Exchange rate between two currencies, fee in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub id: i64,
    pub from_currency_id: i64,
    pub to_currency_id: i64,
    pub rate: f64,
    pub fee: f64,
    pub from_currency: CurrencyInfo,
    pub to_currency: CurrencyInfo,
}
