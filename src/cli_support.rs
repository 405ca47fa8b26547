//! Plumbing shared by the `vss-lookup` and `vss-validate` binaries.

use crate::catalog::{LoadOptions, SignalIndex};
use crate::resolve_catalog_path;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to stderr; `-v` raises the level to info, `-vv` to
/// debug. `RUST_LOG` overrides both.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "vss_catalog=warn",
        1 => "vss_catalog=info",
        _ => "vss_catalog=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Locate, load, and index the catalog the binaries operate on.
pub fn load_index(explicit: Option<&Path>, any_root: bool) -> Result<SignalIndex> {
    let path = resolve_catalog_path(explicit);
    let mut options = LoadOptions::default();
    if any_root {
        options.root_name = None;
    }
    SignalIndex::load(&path, &options)
        .with_context(|| format!("loading catalog {}", path.display()))
}
