// Typed wrappers over the exchange backend endpoints

pub mod admin_users;
pub mod exchange_rates;
pub mod exchanges;
pub mod profile;
pub mod transactions;
pub mod wallets;

pub use admin_users::AdminUserService;
pub use exchange_rates::ExchangeRateService;
pub use exchanges::ExchangeService;
pub use profile::ProfileService;
pub use transactions::TransactionService;
pub use wallets::WalletService;
