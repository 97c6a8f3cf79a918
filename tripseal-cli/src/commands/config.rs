use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::Context;
use crate::config::{Config, KEYS};
use crate::output::{print_field, print_json, print_success};
use crate::settings::Settings;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show user configuration and effective runtime settings
    Show,
    /// Print the config file location
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

pub async fn run(action: ConfigCommand, ctx: &Context) -> Result<()> {
    match action {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => path(ctx),
        ConfigCommand::Set { key, value } => set(key, value),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let config = Config::load()?;
    let settings = Settings::load()?;

    if ctx.wants_json()? {
        let redacted = Config {
            signer_key: config.signer_key.as_ref().map(|_| "<redacted>".into()),
            ..config
        };
        return print_json(&serde_json::json!({
            "config": redacted,
            "store": ctx.store_path()?,
            "settings": settings,
        }));
    }

    println!("{}", "Configuration:".bold());
    print_field(
        "output_format",
        config.output_format.as_deref().unwrap_or("pretty"),
    );
    print_field("store_path", ctx.store_path()?.display());
    print_field(
        "signer_key",
        if config.signer_key.is_some() {
            "(set)"
        } else {
            "(not set, demo uses a throwaway key)"
        },
    );

    println!();
    println!("{}", "Runtime settings (tripseal.toml, TRIPSEAL_*):".bold());
    print_field("max_attempts", settings.vault.retry.max_attempts);
    print_field(
        "base_delay",
        format!("{} ms", settings.vault.retry.base_delay_ms),
    );
    print_field(
        "capability",
        format!("{} days", settings.vault.capability.duration_days),
    );
    print_field("strict_proofs", settings.vault.strict_proofs);
    print_field("chain_id", settings.chain.chain_id);
    print_field("contract", settings.chain.contract);

    println!();
    println!("{}", "To set a value:".dimmed());
    println!("  tripseal config set <{}> <value>", KEYS.join("|"));
    Ok(())
}

fn path(ctx: &Context) -> Result<()> {
    let path = Config::config_path()?;
    if ctx.json_output {
        return print_json(&serde_json::json!({ "path": path }));
    }
    println!("{}", path.display());
    Ok(())
}

fn set(key: String, value: String) -> Result<()> {
    let mut config = Config::load()?;
    let shown = if key == "signer_key" {
        "<redacted>".to_string()
    } else {
        value.clone()
    };
    config.set(&key, value)?;
    config.save()?;

    print_success(format!("Set {key} = {shown}"));
    Ok(())
}
