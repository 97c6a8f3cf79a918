use anyhow::{Context as AnyhowContext, Result};
use clap::Subcommand;
use colored::Colorize;
use tripseal_proto::{Verdict, decode_hex, diagnose};

use super::Context;
use crate::output::{print_field, print_json};

#[derive(Subcommand)]
pub enum ProofCommand {
    /// Decode an input proof and check its framing
    Inspect {
        /// Proof bytes as hex (0x prefix optional)
        hex: String,
        /// Exit with an error unless the proof is exactly framed
        #[arg(long)]
        strict: bool,
    },
}

pub async fn run(action: ProofCommand, ctx: &Context) -> Result<()> {
    match action {
        ProofCommand::Inspect { hex, strict } => inspect(&hex, strict, ctx),
    }
}

fn inspect(hex: &str, strict: bool, ctx: &Context) -> Result<()> {
    let bytes = decode_hex(hex).context("Proof is not valid hex")?;
    let diag = diagnose(&bytes);

    if ctx.wants_json()? {
        print_json(&diag)?;
    } else {
        let verdict = match diag.verdict {
            Verdict::Exact => diag.verdict.to_string().green(),
            Verdict::TrailingByte => diag.verdict.to_string().yellow(),
            Verdict::Malformed => diag.verdict.to_string().red(),
        };

        println!("{}", "Input proof:".bold());
        print_field("verdict", verdict);
        print_field("length", diag.len);
        match (diag.num_handles, diag.num_signers, diag.expected_len) {
            (Some(h), Some(s), Some(expected)) => {
                print_field("handles", h);
                print_field("signers", s);
                print_field("expected", expected);
            }
            _ => print_field("header", "(missing)".dimmed()),
        }
        for (i, handle) in diag.handles.iter().enumerate() {
            print_field(&format!("handle[{i}]"), handle);
        }
        if ctx.verbose {
            for (i, sig) in diag.signatures.iter().enumerate() {
                print_field(&format!("sig[{i}]"), sig);
            }
        } else if !diag.signatures.is_empty() {
            print_field("signatures", format!("{} (use -v to show)", diag.signatures.len()));
        }
    }

    match diag.verdict {
        Verdict::Malformed => anyhow::bail!("Proof is malformed"),
        Verdict::TrailingByte if strict => {
            anyhow::bail!("Proof carries a legacy trailing byte")
        }
        _ => Ok(()),
    }
}
