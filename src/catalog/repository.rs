//! Holds one or more indexed catalogs for lookup by key.
//!
//! Consumers that must track several VSS releases side by side register each
//! index under its own `CatalogKey` and resolve signals against an explicit
//! release instead of whichever catalog happened to load last.

use crate::catalog::identity::CatalogKey;
use crate::catalog::index::SignalIndex;
use crate::catalog::model::Node;
use crate::error::LookupError;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
/// In-memory store of signal indexes keyed by `CatalogKey`.
pub struct CatalogRepository {
    catalogs: BTreeMap<CatalogKey, Arc<SignalIndex>>,
}

impl CatalogRepository {
    /// Register an index, returning the one previously held under `key`.
    pub fn register(
        &mut self,
        key: CatalogKey,
        index: Arc<SignalIndex>,
    ) -> Option<Arc<SignalIndex>> {
        self.catalogs.insert(key, index)
    }

    pub fn get(&self, key: &CatalogKey) -> Option<&Arc<SignalIndex>> {
        self.catalogs.get(key)
    }

    /// Registered keys in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &CatalogKey> {
        self.catalogs.keys()
    }

    /// Resolve a path inside a registered catalog.
    pub fn resolve(&self, key: &CatalogKey, path: &str) -> Result<&Node, LookupError> {
        self.get(key)
            .ok_or_else(|| LookupError::UnknownCatalog(key.clone()))?
            .resolve_by_path(path)
    }
}
