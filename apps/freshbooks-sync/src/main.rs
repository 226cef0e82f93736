mod config;
mod logging;
mod sync;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use freshbooks_client::FreshBooksClient;
use freshbooks_connector::Connector;
use freshbooks_connector_sdk::ConnectorApi;
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// FreshBooks identity sync - exports team members, roles and role
/// assignments as JSON lines
#[derive(Parser)]
#[command(name = "freshbooks-sync")]
#[command(about = "Sync FreshBooks team members and roles as JSON lines")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Static FreshBooks access token
    #[arg(long)]
    token: Option<String>,

    /// OAuth2 refresh token (requires client id and secret)
    #[arg(long = "refresh-token")]
    refresh_token: Option<String>,

    /// OAuth2 client id
    #[arg(long = "fb-client-id")]
    client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long = "fb-client-secret")]
    client_secret: Option<String>,

    /// API base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Team members per request, 1 to 100
    #[arg(long)]
    page_size: Option<u32>,

    /// Known business id; skips the lookup
    #[arg(long)]
    business_id: Option<String>,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run a full sync
    Sync,
    /// Validate configuration and credentials, then exit
    Check,
}

impl Cli {
    /// Command-line values as a config layer; absent flags leave lower
    /// layers untouched.
    fn overrides(&self) -> Value {
        let mut credentials = Map::new();
        insert_some(&mut credentials, "token", self.token.as_ref());
        insert_some(&mut credentials, "refresh_token", self.refresh_token.as_ref());
        insert_some(&mut credentials, "client_id", self.client_id.as_ref());
        insert_some(&mut credentials, "client_secret", self.client_secret.as_ref());

        let mut api = Map::new();
        insert_some(&mut api, "base_url", self.base_url.as_ref());
        insert_some(&mut api, "page_size", self.page_size.as_ref());
        insert_some(&mut api, "business_id", self.business_id.as_ref());

        let mut output = Map::new();
        insert_some(
            &mut output,
            "path",
            self.output.as_ref().map(|p| p.to_string_lossy()).as_ref(),
        );

        let mut logging = Map::new();
        if self.log_json {
            logging.insert("json".into(), json!(true));
        }

        let mut root = Map::new();
        for (key, section) in [
            ("credentials", credentials),
            ("api", api),
            ("output", output),
            ("logging", logging),
        ] {
            if !section.is_empty() {
                root.insert(key.into(), Value::Object(section));
            }
        }
        Value::Object(root)
    }
}

fn insert_some<T: serde::Serialize>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_owned(), json!(value));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // defaults -> YAML (if provided) -> env (FRESHBOOKS_*) -> CLI
    let config = AppConfig::load(cli.config.as_deref(), &cli.overrides())?;
    logging::init(&config.logging, cli.verbose)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let connector = build_connector(&config, cancel)?;

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => run_sync(&config, &connector).await,
        Commands::Check => check(&connector).await,
    }
}

fn build_connector(config: &AppConfig, cancel: CancellationToken) -> Result<Connector> {
    let mut builder = FreshBooksClient::builder(config.credentials()?)
        .config(config.client_config()?)
        .cancellation(cancel);
    if let Some(id) = config.business_id() {
        builder = builder.business_id(id);
    }
    let client = builder.build().context("failed to build FreshBooks client")?;

    tracing::debug!(
        refresh = client.uses_refresh_token(),
        base_url = %config.api.base_url,
        "client ready"
    );
    Ok(Connector::new(Arc::new(client)).with_page_size(config.api.page_size))
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupt received, cancelling requests");
                cancel.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
        }
    });
}

async fn run_sync(config: &AppConfig, connector: &Connector) -> Result<()> {
    let mut out: Box<dyn Write> = match &config.output.path {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    sync::run(connector, config.api.page_size, &mut out).await?;
    Ok(())
}

async fn check(connector: &Connector) -> Result<()> {
    tracing::info!("checking credentials");
    connector
        .validate()
        .await
        .context("FreshBooks validation failed")?;

    let id = connector
        .client()
        .business_id()
        .map_or_else(|| "<unknown>".to_owned(), ToString::to_string);
    println!("Configuration is valid (business {id})");
    Ok(())
}
