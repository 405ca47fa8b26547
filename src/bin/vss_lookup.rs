//! Resolve a signal by path or uuid and print its definition as JSON.
//!
//! With `--children` the direct children of a branch are listed instead, and
//! `--leaves` lists every signal below the given path. `--stats` prints node
//! counts for the whole catalog.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use vss_catalog::SignalIndex;
use vss_catalog::cli_support::{init_logging, load_index};

#[derive(Parser)]
#[command(name = "vss-lookup", version, about = "Look up signals in a VSS catalog")]
struct Cli {
    /// Dotted signal path, e.g. Vehicle.Body.Lights.IsBrakeOn
    path: Option<String>,

    /// Resolve by uuid instead of path
    #[arg(long, conflicts_with = "path")]
    uuid: Option<String>,

    /// List the direct children of a branch
    #[arg(long, conflicts_with = "leaves")]
    children: bool,

    /// List every signal below the path
    #[arg(long)]
    leaves: bool,

    /// Print node counts per kind
    #[arg(long)]
    stats: bool,

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

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&index.stats())?);
        return Ok(());
    }

    let path = match (&cli.path, &cli.uuid) {
        (Some(path), _) => path.clone(),
        (None, Some(uuid)) => index.path_of(index.resolve_by_uuid(uuid)?),
        (None, None) => bail!("a signal path or --uuid is required"),
    };

    if cli.children {
        print_children(&index, &path)
    } else if cli.leaves {
        for (leaf_path, node) in index.leaves_under(&path)? {
            println!("{}", serde_json::to_string(&node.summary(leaf_path))?);
        }
        Ok(())
    } else {
        let node = index.resolve_by_path(&path)?;
        println!("{}", serde_json::to_string_pretty(&node.summary(path.clone()))?);
        Ok(())
    }
}

fn print_children(index: &SignalIndex, path: &str) -> Result<()> {
    for child in index.children(path)? {
        println!(
            "{}",
            serde_json::to_string(&child.summary(index.path_of(child)))?
        );
    }
    Ok(())
}
