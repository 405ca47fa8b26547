//! Vehicle Signal Specification catalog engine.
//!
//! The crate loads a VSS signal tree from its JSON export, indexes it by
//! dotted path and UUID, and validates candidate signal values against the
//! declared datatype, bounds, and enumerations. Everything is immutable once
//! loaded: build a `SignalIndex` at startup, wrap it in an `Arc`, and query
//! it from as many threads as needed.
//!
//! The helpers in this file are shared by the `vss-*` binaries: catalog
//! location discovery and parsing of `(path_or_uuid, value)` sample streams.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

pub mod catalog;
pub mod cli_support;
pub mod error;
pub mod schema_loader;
pub mod value_validation;

pub use catalog::{
    Catalog, CatalogKey, CatalogRepository, CatalogStats, Constraint, DEFAULT_ROOT_NAME,
    Datatype, LoadOptions, Node, NodeBody, NodeId, NodeKind, NodeSummary, ScalarType,
    SignalIndex, SignalSpec, SignalUuid, load_catalog_from_path, load_catalog_from_str,
    load_catalog_from_value,
};
pub use error::{LookupError, MalformedCatalogError, NodeProblem, SignalError, ValidationError};
pub use value_validation::{SignalValue, validate, validate_text};

/// Environment variable naming the catalog file the binaries load.
pub const CATALOG_ENV: &str = "VSS_CATALOG";
const BUNDLED_CATALOG: &str = "catalog/vss_sample.json";

/// The sample catalog shipped with the crate.
pub fn bundled_catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(BUNDLED_CATALOG)
}

/// Pick the catalog file to load.
///
/// An explicit path wins, then a non-empty `VSS_CATALOG`, then the bundled
/// sample catalog.
pub fn resolve_catalog_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var_os(CATALOG_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => bundled_catalog_path(),
    }
}

#[derive(Debug, Clone, Deserialize)]
/// One value addressed to a signal by path or by uuid.
pub struct SignalSample {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    pub value: Value,
}

/// Which signal a sample addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleTarget<'a> {
    Path(&'a str),
    Uuid(&'a str),
}

impl SignalSample {
    /// Exactly one of `path` or `uuid` must be present.
    pub fn target(&self) -> Result<SampleTarget<'_>> {
        match (self.path.as_deref(), self.uuid.as_deref()) {
            (Some(path), None) => Ok(SampleTarget::Path(path)),
            (None, Some(uuid)) => Ok(SampleTarget::Uuid(uuid)),
            (Some(_), Some(_)) => bail!("sample sets both 'path' and 'uuid'"),
            (None, None) => bail!("sample sets neither 'path' nor 'uuid'"),
        }
    }

    /// Resolve the target signal and validate the sample's value against it.
    pub fn validate_against(&self, index: &SignalIndex) -> Result<SignalValue> {
        let validated = match self.target()? {
            SampleTarget::Path(path) => index.validate_path(path, &self.value),
            SampleTarget::Uuid(uuid) => index.validate_uuid(uuid, &self.value),
        };
        Ok(validated?)
    }
}

/// Parse samples from text, accepting a JSON array, a single object, or NDJSON.
///
/// Empty input is an error. NDJSON lines are parsed one by one so the error
/// names the offending line.
pub fn parse_sample_stream(input: &str) -> Result<Vec<SignalSample>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("No samples provided");
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<_>, _>>()
                .context("Unable to parse JSON array of samples"),
            Value::Object(_) => serde_json::from_value(value)
                .map(|sample| vec![sample])
                .context("Unable to parse sample"),
            _ => bail!("Unsupported JSON input; expected object or array"),
        };
    }

    let mut samples = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sample: SignalSample = serde_json::from_str(line)
            .with_context(|| format!("Unable to parse sample from line {}", idx + 1))?;
        samples.push(sample);
    }

    if samples.is_empty() {
        bail!("No samples found in input stream");
    }

    Ok(samples)
}
