use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CurrencyInfo;

/// Balance of one currency for the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: f64,
    #[serde(default)]
    pub locked: f64,
    pub created_at: DateTime<Utc>,
    pub currency: CurrencyInfo,
}

impl Wallet {
    /// Balance not reserved by pending operations
    pub fn available(&self) -> f64 {
        self.balance - self.locked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Exchange,
    Referral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
