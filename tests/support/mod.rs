#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use vss_catalog::{LoadOptions, SignalIndex, bundled_catalog_path, load_catalog_from_value};

pub fn sample_index() -> SignalIndex {
    SignalIndex::load(&bundled_catalog_path(), &LoadOptions::default())
        .expect("bundled sample catalog must load")
}

/// Index a catalog given as a JSON document.
pub fn index_from(doc: Value) -> Result<SignalIndex> {
    let catalog = load_catalog_from_value(doc, &LoadOptions::default())?;
    Ok(SignalIndex::build_from(Arc::new(catalog)))
}

/// Deterministic, distinct 32-hex uuid for test fixtures.
pub fn uuid(seed: u32) -> String {
    format!("{seed:032x}")
}

/// `Vehicle` root with the given children.
pub fn vehicle(children: Value) -> Value {
    json!({
        "Vehicle": {
            "type": "branch",
            "description": "High-level vehicle data.",
            "uuid": uuid(1),
            "children": children,
        }
    })
}

/// Write `doc` to a temporary file; the file lives as long as the handle.
pub fn write_catalog(doc: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to allocate catalog file")?;
    serde_json::to_writer_pretty(&mut file, doc)?;
    file.flush()?;
    Ok(file)
}
