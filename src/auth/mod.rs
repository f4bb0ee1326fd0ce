// Authentication module
// Credential storage, single-flight token refresh and session operations

pub mod manager;
pub mod redirect;
pub mod refresh;
pub mod store;
pub mod types;

pub use manager::AuthManager;
pub use redirect::{LoginRedirect, TerminalRedirect};
pub use store::{CredentialStore, StoredSession};
pub use types::{AuthSession, Credentials, RegisterRequest};
