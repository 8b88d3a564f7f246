//! Command Line Interface for the transaction finder.
mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use txscope_data::{AssetsClient, AssetsConfig, ContractInfoResolver, FcdClient};
use txscope_domain::network::{ENV_FCD_URL, ENV_NETWORK};
use txscope_domain::{NetworkConfig, Transaction, TxSummary};
use txscope_watcher::{PollerConfig, PollSnapshot, TxPoller};

#[derive(Parser)]
#[command(name = "txscope")]
#[command(about = "Find a transaction on the chain or in the mempool", long_about = None)]
struct Cli {
    /// Network preset (mainnet, testnet, localterra)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Override the FCD base URL
    #[arg(long, global = true)]
    fcd_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a transaction until it is confirmed
    Tx {
        /// Transaction hash
        hash: String,

        /// Milliseconds between poll cycles
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Stop after the first poll cycle
        #[arg(long)]
        once: bool,

        /// Print the raw transaction as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Do not treat request failures as "not found"
        #[arg(long)]
        strict: bool,
    },
    /// Look up the label of a contract address
    Contract {
        /// Contract address
        address: String,

        /// Base URL of the asset registry
        #[arg(long, default_value = "https://assets.terra.money")]
        assets_url: String,
    },
    /// Fetch any FCD path and print the JSON body
    Get {
        /// Path relative to the FCD base URL (e.g. v1/blocks/latest)
        path: String,

        /// Query parameter as key=value, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let network = resolve_network(&cli)?;
    debug!(network = %network.kind, fcd_url = %network.fcd_url, "Resolved network");

    match cli.command {
        Commands::Tx {
            hash,
            interval_ms,
            once,
            json,
            strict,
        } => {
            let mut config = PollerConfig::default().with_interval(Duration::from_millis(interval_ms));
            if strict {
                config = config.strict_not_found();
            }
            if once {
                lookup_tx(&hash, &network, &config, json).await?;
            } else {
                watch_tx(&hash, &network, config, json).await?;
            }
        }
        Commands::Contract { address, assets_url } => {
            let client = FcdClient::new(network.clone()).context("Failed to build FCD client")?;
            let assets = AssetsClient::new(AssetsConfig { base_url: assets_url });
            let resolver = ContractInfoResolver::new(client, network.kind, assets);

            match resolver.resolve(address.trim()).await {
                Some(label) => println!("{label}"),
                None => println!("{address}: unknown contract"),
            }
        }
        Commands::Get { path, params } => {
            let client = FcdClient::new(network).context("Failed to build FCD client")?;
            let params: BTreeMap<String, String> = params.into_iter().collect();
            let body: Value = client
                .get_json(&path, &params)
                .await
                .with_context(|| format!("Request to {path} failed"))?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

/// Command-line values win over the environment.
fn resolve_network(cli: &Cli) -> Result<NetworkConfig> {
    NetworkConfig::from_lookup(|key| match key {
        ENV_NETWORK if cli.network.is_some() => cli.network.clone(),
        ENV_FCD_URL if cli.fcd_url.is_some() => cli.fcd_url.clone(),
        _ => std::env::var(key).ok(),
    })
    .context("Invalid network configuration")
}

/// Runs a single complete poll cycle and prints what it found.
async fn lookup_tx(hash: &str, network: &NetworkConfig, config: &PollerConfig, json: bool) -> Result<()> {
    let client = FcdClient::new(network.clone()).context("Failed to build FCD client")?;
    let mut poller = TxPoller::new(hash, Arc::new(client), config)?;
    let snapshot = poller.poll_once().await;

    match &snapshot.stored_result {
        Some(tx) => print_tx(tx, json)?,
        None => println!("{}: not found", snapshot.hash),
    }
    Ok(())
}

async fn watch_tx(hash: &str, network: &NetworkConfig, config: PollerConfig, json: bool) -> Result<()> {
    let handle = txscope_watcher::start(hash, network, config)?;
    let mut updates = handle.subscribe();
    info!(hash = %handle.hash(), session = %handle.session(), "Watching transaction");

    let mut shown: Option<Transaction> = None;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    // Poll task ended without resolving.
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.stop();
                clear_progress();
                bail!("Interrupted");
            }
        }

        let snapshot: PollSnapshot = updates.borrow_and_update().clone();
        if snapshot.stored_result != shown {
            clear_progress();
            if let Some(tx) = &snapshot.stored_result {
                print_tx(tx, json)?;
            }
            shown = snapshot.stored_result.clone();
        }

        if snapshot.resolved {
            break;
        }
        show_progress(&snapshot);
    }

    handle.stop();
    Ok(())
}

fn show_progress(snapshot: &PollSnapshot) {
    let status = if snapshot.stored_result.is_some() {
        "pending, waiting for confirmation"
    } else {
        "searching"
    };
    let mut stderr = std::io::stderr();
    let _ = write!(
        stderr,
        "\r{} {} ({} cycles)",
        render::progress_bar(snapshot.progress, 30),
        status,
        snapshot.cycles
    );
    let _ = stderr.flush();
}

fn clear_progress() {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r\x1b[2K");
    let _ = stderr.flush();
}

fn print_tx(tx: &Transaction, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tx)?);
        return Ok(());
    }
    let summary = TxSummary::from_response(tx);
    render::summary_table(&summary, chrono::Utc::now()).printstd();
    Ok(())
}
