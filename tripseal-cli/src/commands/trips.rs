use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result, bail};
use chrono::DateTime;
use clap::Subcommand;
use colored::Colorize;
use tripseal_core::ledger::EvmLedger;
use tripseal_core::{LocalSigner, VaultClient, XChaChaSealer};
use tripseal_storage::InMemoryCapabilityStore;

use super::Context;
use crate::config::Config;
use crate::output::{print_field, print_info, print_json};
use crate::settings::{ChainSettings, Settings};

#[derive(Subcommand)]
pub enum TripsCommand {
    /// List your trips stored on a deployed contract
    List {
        /// JSON-RPC endpoint (overrides chain.rpc_url)
        #[arg(long, env = "TRIPSEAL_RPC_URL")]
        rpc_url: Option<String>,
    },
}

pub async fn run(action: TripsCommand, ctx: &Context) -> Result<()> {
    match action {
        TripsCommand::List { rpc_url } => list(rpc_url, ctx).await,
    }
}

async fn list(rpc_url: Option<String>, ctx: &Context) -> Result<()> {
    let settings = Settings::load()?;
    let config = Config::load()?;

    let key = config
        .signer_key
        .as_deref()
        .context("No signer key configured (tripseal config set signer_key <hex>)")?;
    let signer = LocalSigner::from_hex(key)?;

    let ledger = open_ledger(rpc_url.as_deref(), &settings.chain, &signer)?;
    tracing::debug!(url = %ledger.rpc_url(), contract = %settings.chain.contract, "listing trips");

    // Listing reads plaintext summaries only; no capability or sealing key is used
    let vault = VaultClient::new(
        Arc::new(ledger),
        Arc::new(InMemoryCapabilityStore::new()),
        Arc::new(XChaChaSealer::random()),
    )
    .with_signer(Arc::new(signer));

    let trips = vault
        .list_trips()
        .await
        .context("Failed to list trips from the ledger")?;

    if ctx.wants_json()? {
        return print_json(&trips);
    }

    if trips.is_empty() {
        print_info("No trips stored for this signer");
        return Ok(());
    }

    println!("{}", "Your trips:".bold());
    for trip in &trips {
        let when = DateTime::from_timestamp(trip.created_at as i64, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| trip.created_at.to_string());
        println!("  #{} {} [{}]", trip.id, trip.title, trip.style_label().cyan());
        print_field("created", when);
    }
    Ok(())
}

/// `--rpc-url` wins over `chain.rpc_url`
fn open_ledger(
    flag: Option<&str>,
    chain: &ChainSettings,
    signer: &LocalSigner,
) -> Result<EvmLedger> {
    let Some(url) = flag.or(chain.rpc_url.as_deref()) else {
        bail!("No RPC endpoint: pass --rpc-url or set chain.rpc_url in tripseal.toml");
    };
    EvmLedger::new(url, chain.contract, signer.inner().clone())
        .with_context(|| format!("Cannot use RPC endpoint {url}"))
}
