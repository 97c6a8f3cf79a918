use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as AnyhowContext, Result};
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tripseal_core::{
    CapabilitySigner, DecryptedTrip, InMemoryLedger, LocalSigner, MockEngine, OperationKind,
    OperationPhase, ProgressObserver, SubmitReceipt, TravelStyle, TripDraft, TripSummary,
    VaultClient, VaultError, XChaChaSealer,
};
use tripseal_storage::{CapabilityStore, InMemoryCapabilityStore};

use super::Context;
use crate::config::Config;
use crate::output::{print_failure, print_field, print_json, print_success};
use crate::settings::Settings;

#[derive(Args)]
pub struct DemoArgs {
    /// Trip title
    #[arg(long, default_value = "Lisbon long weekend")]
    pub title: String,
    /// Travel style: id (0-4) or label
    #[arg(long, default_value = "leisure")]
    pub style: TravelStyle,
    /// First day (YYYY-MM-DD)
    #[arg(long, default_value = "2025-06-12")]
    pub start: NaiveDate,
    /// Last day (YYYY-MM-DD)
    #[arg(long, default_value = "2025-06-15")]
    pub end: NaiveDate,
    #[arg(long, default_value = "Lisbon, Sintra")]
    pub destinations: String,
    #[arg(long, default_value = "Tram 28, Pena Palace, pastéis de nata")]
    pub plan: String,
    /// Emit proofs with the legacy trailing byte
    #[arg(long)]
    pub legacy_proof: bool,
    /// Number of transient oracle failures to inject before sealing succeeds
    #[arg(long, default_value_t = 0)]
    pub oracle_failures: u32,
    /// Keep capabilities in memory instead of the store directory
    #[arg(long)]
    pub ephemeral: bool,
}

/// Mirrors vault phases onto a spinner
struct SpinnerObserver {
    bar: ProgressBar,
}

impl ProgressObserver for SpinnerObserver {
    fn on_transition(&self, kind: OperationKind, _from: OperationPhase, to: OperationPhase) {
        let verb = match kind {
            OperationKind::Submit | OperationKind::Prepare => "submit",
            OperationKind::Retrieve => "retrieve",
        };
        self.bar.set_message(format!("{verb}: {to}"));
    }
}

#[derive(Serialize)]
struct DemoReport {
    signer: alloy::primitives::Address,
    contract: alloy::primitives::Address,
    receipt: SubmitReceipt,
    trips: Vec<TripSummary>,
    retrieved: DecryptedTrip,
}

pub async fn run(args: DemoArgs, ctx: &Context) -> Result<()> {
    let json = ctx.wants_json()?;
    let settings = Settings::load().context("Failed to load tripseal.toml / TRIPSEAL_* settings")?;
    let config = Config::load()?;

    let engine = Arc::new(
        MockEngine::new()
            .with_chain_id(settings.chain.chain_id)
            .with_legacy_trailing_byte(args.legacy_proof),
    );
    for _ in 0..args.oracle_failures {
        engine.fail_next("Relayer didn't response correctly. Bad JSON.");
    }
    let ledger = Arc::new(
        InMemoryLedger::new(settings.chain.contract).with_coprocessor(engine.coprocessor_address()),
    );

    let signer = match &config.signer_key {
        Some(key) => LocalSigner::from_hex(key)?,
        None => LocalSigner::random(),
    };
    let signer_address = signer.address();

    let store: Arc<dyn CapabilityStore> = if args.ephemeral {
        Arc::new(InMemoryCapabilityStore::new())
    } else {
        Arc::new(ctx.open_store().await?)
    };

    let bar = if json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    };

    let vault = VaultClient::new(ledger, store, Arc::new(XChaChaSealer::random()))
        .with_engine(engine)
        .with_signer(Arc::new(signer))
        .with_settings(settings.vault.clone())
        .with_observer(Arc::new(SpinnerObserver { bar: bar.clone() }));

    let draft = TripDraft {
        title: args.title,
        style: args.style.id(),
        start_date: args.start,
        end_date: args.end,
        destinations: args.destinations,
        plan: args.plan,
    };

    let outcome = run_flow(&vault, &draft).await;
    bar.finish_and_clear();

    let (receipt, trips, retrieved) = match outcome {
        Ok(done) => done,
        Err(e) => {
            let kind = e.kind();
            if !json {
                print_failure(&e);
            }
            return Err(anyhow::Error::new(e).context(format!("demo failed ({kind})")));
        }
    };

    if json {
        return print_json(&DemoReport {
            signer: signer_address,
            contract: vault.contract(),
            receipt,
            trips,
            retrieved,
        });
    }

    print_success(format!(
        "Stored trip #{} ({} nights)",
        receipt.record_id.unwrap_or_default(),
        receipt.nights
    ));
    print_field("signer", signer_address);
    print_field("contract", vault.contract());

    println!();
    println!("{}", "Your trips:".bold());
    for trip in &trips {
        println!("  #{} {} [{}]", trip.id, trip.title, trip.style_label().cyan());
    }

    println!();
    println!("{}", "Decrypted:".bold());
    print_field("title", &retrieved.title);
    print_field("style", TravelStyle::label_for(retrieved.style));
    print_field(
        "dates",
        format!("{} → {}", retrieved.route.start_date, retrieved.route.end_date),
    );
    print_field("destinations", &retrieved.route.destinations);
    print_field("plan", &retrieved.schedule.plan);
    match retrieved.nights {
        Some(n) => print_field("nights", n),
        None => print_field("nights", "(not decrypted)".dimmed()),
    }
    Ok(())
}

async fn run_flow(
    vault: &VaultClient,
    draft: &TripDraft,
) -> Result<(SubmitReceipt, Vec<TripSummary>, DecryptedTrip), VaultError> {
    let receipt = vault.submit(draft).await?;
    let trips = vault.list_trips().await?;
    let id = receipt.record_id.unwrap_or_default();
    let retrieved = vault.retrieve(id).await?;
    Ok((receipt, trips, retrieved))
}
