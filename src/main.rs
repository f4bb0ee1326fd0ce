use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Password;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use midas_client::auth::{AuthManager, CredentialStore, RegisterRequest, TerminalRedirect};
use midas_client::config::{CliArgs, Command, Config};
use midas_client::http_client::ApiClient;
use midas_client::models::exchange::CreateExchangeRequest;
use midas_client::services::transactions::HistoryQuery;
use midas_client::services::wallets::{DepositRequest, WithdrawRequest};
use midas_client::services::{
    ExchangeRateService, ExchangeService, TransactionService, WalletService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so its values act as environment variables
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    // Initialize logging with a configured level; stdout is reserved for results
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::debug!(
        api_url = %config.api_url,
        session_file = %config.session_file.display(),
        "Configuration loaded"
    );

    let store = Arc::new(CredentialStore::open(&config.session_file));
    let client = Arc::new(ApiClient::new(
        config.client_options(),
        store,
        Arc::new(TerminalRedirect),
    )?);

    run(args.command, client).await
}

async fn run(command: Command, client: Arc<ApiClient>) -> Result<()> {
    let auth = AuthManager::new(client.clone());

    match command {
        Command::Login {
            email,
            password,
            remember_me,
        } => {
            let password = password_or_prompt(password)?;
            let user = auth.login(&email, &password, remember_me).await?;
            eprintln!("Signed in as {}", user.email);
        }

        Command::Register(registration) => {
            let password = password_or_prompt(registration.password)?;
            let user = auth
                .register(&RegisterRequest {
                    email: registration.email,
                    first_name: registration.first_name,
                    last_name: registration.last_name,
                    password,
                    referral_code: registration.referral_code,
                })
                .await?;
            eprintln!("Welcome to Midas Exchange, {}!", user.full_name());
        }

        Command::Logout => {
            auth.logout().await;
            eprintln!("Logged out");
        }

        Command::Whoami => match auth.check_auth().await? {
            Some(user) => print_json(&user)?,
            None => anyhow::bail!("Not signed in. Run `midas login` first."),
        },

        Command::Currencies => print_json(&WalletService::new(client).currencies().await?)?,

        Command::Wallets => print_json(&WalletService::new(client).wallets().await?)?,

        Command::Deposit { currency, amount } => {
            let result = WalletService::new(client)
                .deposit(&DepositRequest { currency, amount })
                .await?;
            print_json(&result)?;
        }

        Command::Withdraw {
            currency,
            amount,
            address,
        } => {
            let result = WalletService::new(client)
                .withdraw(&WithdrawRequest {
                    currency,
                    amount,
                    address,
                })
                .await?;
            print_json(&result)?;
        }

        Command::History {
            kind,
            status,
            limit,
        } => {
            let query = HistoryQuery {
                kind: kind.as_deref().map(parse_variant).transpose()?,
                status: status.as_deref().map(parse_variant).transpose()?,
                limit,
            };
            print_json(&TransactionService::new(client).history(&query).await?)?;
        }

        Command::Pairs => print_json(&ExchangeService::new(client).pairs().await?)?,

        Command::Exchange { from, to, amount } => {
            let created = ExchangeService::new(client)
                .create(&CreateExchangeRequest {
                    from_currency_code: from.to_uppercase(),
                    to_currency_code: to.to_uppercase(),
                    from_amount: amount,
                })
                .await?;
            print_json(&created)?;
        }

        Command::Exchanges { limit, offset } => {
            print_json(&ExchangeService::new(client).list(limit, offset).await?)?
        }

        Command::CancelExchange { id } => {
            print_json(&ExchangeService::new(client).cancel(id).await?)?
        }

        Command::Rates => print_json(&ExchangeRateService::new(client).list().await?)?,
    }

    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password"),
    }
}

/// Parse a lowercase enum variant the way the backend spells it
fn parse_variant<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .with_context(|| format!("Unknown value: {}", value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", json);
    Ok(())
}
