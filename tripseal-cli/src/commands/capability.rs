use alloy::primitives::Address;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use tripseal_core::DecryptionCapability;
use tripseal_core::capability::list_cached;
use tripseal_storage::CapabilityStore;

use super::Context;
use crate::output::{print_field, print_info, print_json, print_success};

#[derive(Subcommand)]
pub enum CapabilityCommand {
    /// List cached capabilities
    List,
    /// Show one cached capability (private key is never printed)
    Show {
        /// Store key, as printed by `list`
        key: String,
    },
    /// Remove every cached capability
    Clear,
}

pub async fn run(action: CapabilityCommand, ctx: &Context) -> Result<()> {
    match action {
        CapabilityCommand::List => list(ctx).await,
        CapabilityCommand::Show { key } => show(ctx, &key).await,
        CapabilityCommand::Clear => clear(ctx).await,
    }
}

/// Public view of a capability
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapabilityView {
    key: String,
    user_address: Option<Address>,
    contract_addresses: Vec<Address>,
    start_timestamp: Option<u64>,
    expires_at: Option<u64>,
    valid: bool,
}

impl CapabilityView {
    fn new(key: String, capability: Option<&DecryptionCapability>) -> Self {
        match capability {
            Some(c) => Self {
                key,
                user_address: Some(c.user_address),
                contract_addresses: c.contract_addresses.clone(),
                start_timestamp: Some(c.start_timestamp),
                expires_at: Some(c.expires_at()),
                valid: c.is_valid(),
            },
            None => Self {
                key,
                user_address: None,
                contract_addresses: Vec::new(),
                start_timestamp: None,
                expires_at: None,
                valid: false,
            },
        }
    }
}

fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

async fn list(ctx: &Context) -> Result<()> {
    let store = ctx.open_store().await?;
    let views: Vec<CapabilityView> = list_cached(&store)
        .await?
        .into_iter()
        .map(|(key, cap)| CapabilityView::new(key, cap.as_ref()))
        .collect();

    if ctx.wants_json()? {
        return print_json(&views);
    }

    if views.is_empty() {
        print_info(format!("No cached capabilities in {}", store.root().display()));
        return Ok(());
    }

    println!("{}", "Cached capabilities:".bold());
    for view in &views {
        let status = match (view.user_address, view.valid) {
            (None, _) => "unreadable".red(),
            (Some(_), true) => "valid".green(),
            (Some(_), false) => "expired".yellow(),
        };
        println!("  {} [{}]", view.key, status);
        if let Some(expires) = view.expires_at {
            println!(
                "    {} contract(s), expires {}",
                view.contract_addresses.len(),
                format_time(expires).dimmed()
            );
        }
    }
    Ok(())
}

async fn show(ctx: &Context, key: &str) -> Result<()> {
    let store = ctx.open_store().await?;
    let raw = store
        .get_item(key)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No capability stored under '{key}'"))?;
    let capability: Option<DecryptionCapability> = serde_json::from_str(&raw).ok();
    let view = CapabilityView::new(key.to_string(), capability.as_ref());

    if ctx.wants_json()? {
        return print_json(&view);
    }

    let Some(capability) = capability else {
        anyhow::bail!("Record '{key}' is not a readable capability");
    };

    println!("{}", "Decryption capability:".bold());
    print_field("user", capability.user_address);
    for contract in &capability.contract_addresses {
        print_field("contract", contract);
    }
    print_field("issued", format_time(capability.start_timestamp));
    print_field("expires", format_time(capability.expires_at()));
    print_field("days", capability.duration_days);
    print_field(
        "status",
        if view.valid {
            "valid".green()
        } else {
            "expired".yellow()
        },
    );
    if ctx.verbose {
        print_field("public key", &capability.public_key);
        print_field("signature", &capability.signature);
    }
    Ok(())
}

async fn clear(ctx: &Context) -> Result<()> {
    let store = ctx.open_store().await?;
    let keys = store.keys().await?;
    for key in &keys {
        store.remove_item(key).await?;
    }

    if ctx.wants_json()? {
        return print_json(&serde_json::json!({ "removed": keys.len() }));
    }
    print_success(format!("Removed {} cached capabilities", keys.len()));
    Ok(())
}
