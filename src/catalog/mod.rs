//! Signal catalog wiring.
//!
//! `loader` turns the JSON export of a VSS tree into an arena-backed
//! `Catalog`; `SignalIndex` adds path and UUID lookup on top of it, and
//! `CatalogRepository` keeps several indexed releases apart by key.

pub mod identity;
pub mod index;
pub mod loader;
pub mod model;
pub mod repository;

pub use identity::{CatalogKey, Datatype, NodeKind, ScalarType, SignalUuid};
pub use index::{CatalogStats, SignalIndex};
pub use loader::{
    DEFAULT_ROOT_NAME, LoadOptions, load_catalog_from_path, load_catalog_from_str,
    load_catalog_from_value,
};
pub use model::{
    Catalog, Constraint, Node, NodeBody, NodeId, NodeSummary, RawNode, SignalSpec,
};
pub use repository::CatalogRepository;
