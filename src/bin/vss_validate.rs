//! Validate signal values against a VSS catalog.
//!
//! Either a single `--path`/`--uuid` plus `--value`, or a stream of samples on
//! stdin (JSON array or NDJSON of `{"path"|"uuid": .., "value": ..}`). Each
//! accepted value is printed as one NDJSON line with its normalized form;
//! rejected samples are reported on stderr and make the exit status non-zero.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use std::io::{self, Read};
use std::path::PathBuf;
use vss_catalog::cli_support::{init_logging, load_index};
use vss_catalog::{SignalSample, parse_sample_stream};

#[derive(Parser)]
#[command(name = "vss-validate", version, about = "Validate values against a VSS catalog")]
struct Cli {
    /// Signal path to validate against
    #[arg(long, conflicts_with = "uuid", requires = "value")]
    path: Option<String>,

    /// Signal uuid to validate against
    #[arg(long, requires = "value")]
    uuid: Option<String>,

    /// Value to check; parsed as JSON when possible, otherwise taken as text
    #[arg(long)]
    value: Option<String>,

    /// Catalog file (defaults to $VSS_CATALOG, then the bundled sample)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Accept catalogs whose root is not named `Vehicle`
    #[arg(long)]
    any_root: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let index = load_index(cli.catalog.as_deref(), cli.any_root)?;
    let samples = match cli.value {
        Some(raw) => vec![SignalSample {
            path: cli.path,
            uuid: cli.uuid,
            value: serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        }],
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading samples from stdin")?;
            parse_sample_stream(&input)?
        }
    };

    let mut failures = 0usize;
    for (idx, sample) in samples.iter().enumerate() {
        match sample.validate_against(&index) {
            Ok(value) => {
                let record = json!({
                    "path": sample.path,
                    "uuid": sample.uuid,
                    "value": value.to_json(),
                });
                println!("{}", serde_json::to_string(&record)?);
            }
            Err(err) => {
                failures += 1;
                eprintln!("vss-validate: sample {}: {err:#}", idx + 1);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} sample(s) rejected", samples.len());
    }
    Ok(())
}
