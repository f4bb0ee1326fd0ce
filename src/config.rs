use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::http_client::ClientOptions;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

/// Midas Exchange command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Backend API base URL
    #[arg(long, env = "MIDAS_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Session file holding the stored tokens
    #[arg(long, env = "MIDAS_SESSION_FILE", global = true)]
    pub session_file: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout", env = "HTTP_REQUEST_TIMEOUT", default_value = "30", global = true)]
    pub request_timeout: u64,

    /// Token refresh timeout in seconds
    #[arg(long, env = "TOKEN_REFRESH_TIMEOUT", default_value = "15", global = true)]
    pub refresh_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "MIDAS_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Ask the backend for a long-lived session
        #[arg(long)]
        remember_me: bool,
    },

    /// Create an account and sign in
    Register(RegisterArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List currencies a wallet can hold
    Currencies,

    /// List wallet balances
    Wallets,

    /// Deposit funds into a wallet
    Deposit {
        currency: String,
        amount: f64,
    },

    /// Withdraw funds to an external address
    Withdraw {
        currency: String,
        amount: f64,
        address: String,
    },

    /// Show transaction history
    History {
        /// deposit, withdrawal, exchange or referral
        #[arg(long = "type")]
        kind: Option<String>,

        /// pending, processing, completed, failed or cancelled
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// List public currency pairs
    Pairs,

    /// Swap between two of your wallets
    Exchange {
        from: String,
        to: String,
        amount: f64,
    },

    /// List your exchanges
    Exchanges {
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,
    },

    /// Cancel a pending exchange
    CancelExchange { id: i64 },

    /// List exchange rates (admin)
    Rates,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Password (prompted when omitted)
    #[arg(short, long, env = "MIDAS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long)]
    pub referral_code: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Backend
    pub api_url: String,

    // Credential storage
    pub session_file: PathBuf,

    // Timeouts
    pub request_timeout: u64,
    pub connect_timeout: u64,
    pub refresh_timeout: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Build configuration with priority: CLI > ENV > defaults
    ///
    /// Call `dotenvy::dotenv()` before parsing so `.env` values act as ENV.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let session_file = match args.session_file {
            Some(ref path) => expand_tilde(path),
            None => default_session_file()
                .context("Cannot determine a config directory; set MIDAS_SESSION_FILE")?,
        };

        Ok(Config {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            session_file,
            request_timeout: args.request_timeout,
            connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            refresh_timeout: args.refresh_timeout,
            log_level: args.log_level.clone(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url)
            .with_context(|| format!("MIDAS_API_URL is not a valid URL: {}", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("MIDAS_API_URL must use http or https: {}", self.api_url);
        }

        if self.request_timeout == 0 || self.connect_timeout == 0 || self.refresh_timeout == 0 {
            anyhow::bail!("Timeouts must be greater than zero");
        }

        if self.refresh_timeout > self.request_timeout {
            anyhow::bail!(
                "TOKEN_REFRESH_TIMEOUT ({}s) must not exceed HTTP_REQUEST_TIMEOUT ({}s)",
                self.refresh_timeout,
                self.request_timeout
            );
        }

        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
            refresh_timeout: Duration::from_secs(self.refresh_timeout),
        }
    }
}

/// `<config_dir>/midas/session.json`
fn default_session_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("midas").join("session.json"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from("/tmp/midas/session.json"),
            request_timeout: 30,
            connect_timeout: 10,
            refresh_timeout: 15,
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/midas/session.json");
        assert!(path.to_string_lossy().contains("midas/session.json"));
        assert!(!path.to_string_lossy().starts_with("~"));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        // Just "~" without slash should not expand
        assert_eq!(expand_tilde("~"), PathBuf::from("~"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut cfg = config();
        cfg.api_url = "not a url".to_string();
        assert!(cfg.validate().is_err());

        cfg.api_url = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut cfg = config();
        cfg.connect_timeout = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_refresh_timeout_bounded_by_request_timeout() {
        let mut cfg = config();
        cfg.refresh_timeout = 60;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("TOKEN_REFRESH_TIMEOUT"));
    }

    #[test]
    fn test_client_options() {
        let options = config().client_options();
        assert_eq!(options.base_url, DEFAULT_API_URL);
        assert_eq!(options.refresh_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::try_parse_from([
            "midas",
            "--api-url",
            "https://api.example.com/api/v1/",
            "--session-file",
            "/tmp/s.json",
            "history",
            "--type",
            "deposit",
            "--limit",
            "5",
        ])
        .unwrap();

        let cfg = Config::from_args(&args).unwrap();
        assert_eq!(cfg.api_url, "https://api.example.com/api/v1");
        assert_eq!(cfg.session_file, PathBuf::from("/tmp/s.json"));
        assert!(matches!(
            args.command,
            Command::History { ref kind, limit: Some(5), .. } if kind.as_deref() == Some("deposit")
        ));
    }
}
