//! Error taxonomy for loading, lookup, and value validation.
//!
//! Load-time failures (`MalformedCatalogError`) are fatal: a catalog is either
//! accepted whole or not at all. Lookup and validation failures are returned
//! per call and describe a bad request, never a damaged index.

use crate::catalog::{CatalogKey, Datatype, NodeKind};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MalformedCatalogError {
    #[error("reading catalog {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("catalog failed schema validation:\n{}", .details.join("\n"))]
    Schema { details: Vec<String> },
    #[error("catalog root: {0}")]
    Root(String),
    #[error("{path}: {problem}")]
    Node { path: String, problem: NodeProblem },
    #[error("catalog has more than {max} nodes")]
    TooManyNodes { max: usize },
}

impl MalformedCatalogError {
    pub(crate) fn node(path: impl Into<String>, problem: NodeProblem) -> Self {
        MalformedCatalogError::Node {
            path: path.into(),
            problem,
        }
    }
}

/// Structural defect of a single catalog node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeProblem {
    #[error("node name must be non-empty and must not contain '.'")]
    InvalidName,
    #[error("name appears more than once under the same parent")]
    DuplicateName,
    #[error("missing 'type'")]
    MissingKind,
    #[error("unknown type '{0}'")]
    UnknownKind(String),
    #[error("branch declares a datatype")]
    BranchWithDatatype,
    #[error("branch has no 'children'")]
    BranchWithoutChildren,
    #[error("{0} declares 'children'")]
    LeafWithChildren(NodeKind),
    #[error("{0} has no datatype")]
    LeafWithoutDatatype(NodeKind),
    #[error("unknown datatype '{0}'")]
    UnknownDatatype(String),
    #[error("missing 'uuid'")]
    MissingUuid,
    #[error("uuid '{0}' is not 32 hexadecimal characters")]
    MalformedUuid(String),
    #[error("uuid {uuid} already used by {first_path}")]
    DuplicateUuid { uuid: String, first_path: String },
    #[error("'allowed' cannot be combined with 'min'/'max'")]
    AllowedWithBounds,
    #[error("'allowed' requires a string datatype, found {0}")]
    AllowedOnNonString(Datatype),
    #[error("'min'/'max' require a numeric datatype, found {0}")]
    BoundsOnNonNumeric(Datatype),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("unknown signal path '{0}'")]
    UnknownPath(String),
    #[error("unknown signal uuid '{0}'")]
    UnknownUuid(String),
    #[error("'{0}' is not a branch")]
    NotABranch(String),
    #[error("no catalog registered under '{0}'")]
    UnknownCatalog(CatalogKey),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("'{name}' is a branch and holds no value")]
    WrongKind { name: String },
    #[error("expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("{value} outside declared range [{}, {}]", fmt_bound(.min), fmt_bound(.max))]
    Range {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[error("'{value}' not in allowed set {allowed:?}")]
    NotAllowed { value: String, allowed: Vec<String> },
    #[error("element {index}")]
    Element {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// The innermost error, looking through array element wrappers.
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::Element { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn fmt_bound(bound: &Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}

/// Failure of a resolve-then-validate call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("invalid value for {path}")]
    Invalid {
        path: String,
        #[source]
        source: ValidationError,
    },
}
