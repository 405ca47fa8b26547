//! Indexed view of a loaded signal catalog.
//!
//! The index is built once from an immutable `Catalog` and never changes
//! afterwards, so an `Arc<SignalIndex>` can be shared across threads and
//! queried without locking. Lookups are exact: paths match the full dotted
//! name including the root, and UUIDs match case-insensitively.

use crate::catalog::identity::{NodeKind, SignalUuid};
use crate::catalog::loader::{LoadOptions, load_catalog_from_path};
use crate::catalog::model::{Catalog, Node, NodeId};
use crate::error::{LookupError, MalformedCatalogError, SignalError};
use crate::value_validation::{SignalValue, validate};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
/// Signal catalog plus path and UUID lookup tables.
pub struct SignalIndex {
    catalog: Arc<Catalog>,
    by_path: HashMap<String, NodeId>,
    by_uuid: HashMap<SignalUuid, NodeId>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
/// Node counts per kind.
pub struct CatalogStats {
    pub branches: usize,
    pub sensors: usize,
    pub actuators: usize,
    pub attributes: usize,
    pub deprecated: usize,
}

impl CatalogStats {
    pub fn total(&self) -> usize {
        self.branches + self.sensors + self.actuators + self.attributes
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Branch => self.branches,
            NodeKind::Sensor => self.sensors,
            NodeKind::Actuator => self.actuators,
            NodeKind::Attribute => self.attributes,
        }
    }
}

impl SignalIndex {
    /// Load a catalog file and index it.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self, MalformedCatalogError> {
        let catalog = load_catalog_from_path(path, options)?;
        Ok(Self::build_from(Arc::new(catalog)))
    }

    /// Walk the tree once, depth-first, recording every node's path and uuid.
    pub fn build_from(catalog: Arc<Catalog>) -> Self {
        let mut by_path = HashMap::with_capacity(catalog.len());
        let mut by_uuid = HashMap::with_capacity(catalog.len());

        let root = catalog.root();
        let mut stack = vec![(root.id(), root.name().to_string())];
        while let Some((id, path)) = stack.pop() {
            let node = catalog.node(id);
            by_uuid.insert(node.uuid().clone(), id);
            if let Some(children) = node.children() {
                for (name, child) in children {
                    stack.push((*child, format!("{path}.{name}")));
                }
            }
            by_path.insert(path, id);
        }

        debug!(paths = by_path.len(), "built signal index");
        Self {
            catalog,
            by_path,
            by_uuid,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Resolve an exact dotted path; no prefix or wildcard matching.
    pub fn resolve_by_path(&self, path: &str) -> Result<&Node, LookupError> {
        self.by_path
            .get(path)
            .map(|id| self.catalog.node(*id))
            .ok_or_else(|| LookupError::UnknownPath(path.to_string()))
    }

    pub fn resolve_by_uuid(&self, uuid: &str) -> Result<&Node, LookupError> {
        SignalUuid::parse(uuid)
            .and_then(|key| self.by_uuid.get(&key))
            .map(|id| self.catalog.node(*id))
            .ok_or_else(|| LookupError::UnknownUuid(uuid.to_string()))
    }

    /// Direct children of a branch, ordered by name.
    pub fn children(&self, path: &str) -> Result<Vec<&Node>, LookupError> {
        let node = self.resolve_by_path(path)?;
        let children = node
            .children()
            .ok_or_else(|| LookupError::NotABranch(path.to_string()))?;
        Ok(children.values().map(|id| self.catalog.node(*id)).collect())
    }

    pub fn path_of(&self, node: &Node) -> String {
        self.catalog.path_of(node.id())
    }

    /// All indexed paths in lexical order.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.by_path.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Every signal in the subtree rooted at `path`, ordered by path.
    ///
    /// A leaf path yields just that leaf. The root must be an exact path; this
    /// is subtree enumeration, not prefix matching.
    pub fn leaves_under(&self, path: &str) -> Result<Vec<(String, &Node)>, LookupError> {
        let start = self.resolve_by_path(path)?;
        let mut leaves = Vec::new();
        let mut stack = vec![(start.id(), path.to_string())];
        while let Some((id, node_path)) = stack.pop() {
            let node = self.catalog.node(id);
            match node.children() {
                Some(children) => {
                    for (name, child) in children {
                        stack.push((*child, format!("{node_path}.{name}")));
                    }
                }
                None => leaves.push((node_path, node)),
            }
        }
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(leaves)
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        for node in self.catalog.nodes() {
            match node.kind() {
                NodeKind::Branch => stats.branches += 1,
                NodeKind::Sensor => stats.sensors += 1,
                NodeKind::Actuator => stats.actuators += 1,
                NodeKind::Attribute => stats.attributes += 1,
            }
            if node.deprecation().is_some() {
                stats.deprecated += 1;
            }
        }
        stats
    }

    /// Resolve `path` and validate `raw` against it.
    pub fn validate_path(&self, path: &str, raw: &Value) -> Result<SignalValue, SignalError> {
        let node = self.resolve_by_path(path)?;
        validate(node, raw).map_err(|source| SignalError::Invalid {
            path: path.to_string(),
            source,
        })
    }

    /// Resolve `uuid` and validate `raw` against it.
    pub fn validate_uuid(&self, uuid: &str, raw: &Value) -> Result<SignalValue, SignalError> {
        let node = self.resolve_by_uuid(uuid)?;
        validate(node, raw).map_err(|source| SignalError::Invalid {
            path: self.path_of(node),
            source,
        })
    }
}
