use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod devices;
pub mod listen;
pub mod notify;
pub mod register;

use crate::api::ClientError;
use crate::core::AppConfig;

pub const TEST_TITLE: &str = "Test notification";
pub const TEST_BODY: &str = "Hello from stablepush!";

#[derive(Subcommand)]
enum Command {
    /// Register this device's push token with the backend
    Register {
        /// Push token, falls back to STABLEPUSH_TOKEN
        #[arg(long)]
        token: Option<String>,
        /// Device model, falls back to STABLEPUSH_DEVICE_MODEL
        #[arg(long)]
        model: Option<String>,
    },
    /// Ask the backend to notify an already registered device
    Notify {
        #[arg(long)]
        device_id: i64,
        #[arg(long, default_value = TEST_TITLE)]
        title: String,
        #[arg(long, default_value = TEST_BODY)]
        body: String,
    },
    /// Register, then send a test notification to the new device
    TestPush {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value = TEST_TITLE)]
        title: String,
        #[arg(long, default_value = TEST_BODY)]
        body: String,
    },
    /// List every registered device
    Devices {},
    /// Show a single device
    Device {
        #[arg(long)]
        id: i64,
    },
    /// Remove a device record
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Send a notification to every device
    Broadcast {
        #[arg(long, default_value = TEST_TITLE)]
        title: String,
        #[arg(long, default_value = TEST_BODY)]
        body: String,
    },
    /// Check that the backend is up
    Health {},
    /// Start an interactive session that reacts to tokens and messages
    Listen {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Logs the full error and prints the short notice for the user
pub(crate) fn report(err: ClientError) -> anyhow::Error {
    tracing::error!("{}", err);
    eprintln!("{}", err.notice());
    anyhow::Error::new(err)
}

pub(crate) fn resolve_token(arg: Option<String>, config: &AppConfig) -> Result<String> {
    arg.or_else(|| config.token.clone())
        .ok_or_else(|| anyhow!("A push token is required, pass --token or set STABLEPUSH_TOKEN"))
}

pub(crate) fn resolve_model(arg: Option<String>, config: &AppConfig) -> String {
    arg.unwrap_or_else(|| config.device_model.clone())
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Register { token, model }) => {
            let token = resolve_token(token, &config)?;
            let model = resolve_model(model, &config);
            register::run(&config, &model, &token).await?;
        }
        Some(Command::Notify {
            device_id,
            title,
            body,
        }) => {
            notify::run(&config, device_id, &title, &body).await?;
        }
        Some(Command::TestPush {
            token,
            model,
            title,
            body,
        }) => {
            let token = resolve_token(token, &config)?;
            let model = resolve_model(model, &config);
            notify::test_push(&config, &model, &token, &title, &body).await?;
        }
        Some(Command::Devices {}) => {
            devices::list(&config).await?;
        }
        Some(Command::Device { id }) => {
            devices::show(&config, id).await?;
        }
        Some(Command::Delete { id }) => {
            devices::delete(&config, id).await?;
        }
        Some(Command::Broadcast { title, body }) => {
            notify::broadcast(&config, &title, &body).await?;
        }
        Some(Command::Health {}) => {
            devices::health(&config).await?;
        }
        Some(Command::Listen { token, model }) => {
            let token = resolve_token(token, &config)?;
            let model = resolve_model(model, &config);
            listen::run(&config, &model, &token).await?;
        }
        None => {}
    }

    Ok(())
}
