//! Decode demo
//!
//! Reads a JSON array of record envelopes from a file (or stdin when no
//! path is given), decodes the batch against a store-less registry, and
//! prints a per-item report. Exits non-zero when every item fails.
//!
//! Usage:
//!   decode-demo [--api-level N] [batch.json]
//!
//! Logging is controlled via RUST_LOG (e.g. RUST_LOG=healthbridge_core=debug).

use anyhow::{bail, Context, Result};
use healthbridge_core::registry::{AllAvailable, PlatformContext};
use healthbridge_core::{decode_batch, RecordEnvelope, TypeRegistry};
use std::io::Read;
use std::sync::Arc;

struct Args {
    api_level: u32,
    path: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut api_level = 34;
    let mut path = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--api-level" => {
                let value = args
                    .next()
                    .context("--api-level requires a value")?;
                api_level = value
                    .parse()
                    .with_context(|| format!("invalid API level: {}", value))?;
            }
            "--help" | "-h" => {
                println!("Usage: decode-demo [--api-level N] [batch.json]");
                std::process::exit(0);
            }
            other if path.is_none() => path = Some(other.to_string()),
            other => bail!("unexpected argument: {}", other),
        }
    }

    Ok(Args { api_level, path })
}

fn read_batch(path: Option<&str>) -> Result<Vec<RecordEnvelope>> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };
    serde_json::from_str(&raw).context("input is not a JSON array of record envelopes")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;
    let batch = read_batch(args.path.as_deref())?;
    if batch.is_empty() {
        bail!("batch is empty");
    }
    tracing::info!(records = batch.len(), api_level = args.api_level, "decoding batch");

    let registry = TypeRegistry::new(PlatformContext::new(
        args.api_level,
        Arc::new(AllAvailable),
    ));
    let result = decode_batch(&registry, &batch);

    let mut decoded = 0;
    for (index, item) in result.items.iter().enumerate() {
        match item {
            Ok(record) => {
                decoded += 1;
                println!("[{}] ok: {}", index, record.record.kind());
                for failure in &record.nested_failures {
                    println!(
                        "      nested failure at {:?}: {}",
                        failure.index_path, failure.message
                    );
                }
            }
            Err(failed) => {
                println!("[{}] FAILED: {}", index, failed.primary.message);
                for failure in &failed.nested_failures {
                    println!(
                        "      nested failure at {:?}: {}",
                        failure.index_path, failure.message
                    );
                }
            }
        }
    }

    println!("\n{}/{} records decoded", decoded, result.items.len());
    if decoded == 0 {
        bail!("every record failed to decode");
    }
    Ok(())
}
