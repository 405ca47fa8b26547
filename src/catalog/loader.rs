//! Builds a `Catalog` from the JSON export of a VSS tree.
//!
//! Loading is all-or-nothing: the raw text is parsed, checked against the
//! embedded catalog schema, deserialized into `RawNode`s, then flattened into
//! the node table while every structural invariant is enforced. The first
//! defect aborts the load with the dotted path of the offending node.

use crate::catalog::identity::{Datatype, NodeKind, SignalUuid};
use crate::catalog::model::{Catalog, Constraint, Node, NodeBody, NodeId, RawNode, SignalSpec};
use crate::error::{MalformedCatalogError, NodeProblem};
use crate::schema_loader::validate_against_schema;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Root name of every VSS tree.
pub const DEFAULT_ROOT_NAME: &str = "Vehicle";

#[derive(Clone, Debug)]
/// Knobs for `load_catalog_*`.
pub struct LoadOptions {
    /// Required name of the single top-level node; `None` accepts any name.
    pub root_name: Option<String>,
    /// Run the embedded JSON Schema over the raw document before loading.
    pub schema_check: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            root_name: Some(DEFAULT_ROOT_NAME.to_string()),
            schema_check: true,
        }
    }
}

/// Read and load a catalog file.
pub fn load_catalog_from_path(
    path: &Path,
    options: &LoadOptions,
) -> Result<Catalog, MalformedCatalogError> {
    let data = fs::read_to_string(path).map_err(|source| MalformedCatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = data.len(), "read catalog file");
    load_catalog_from_str(&data, options)
}

/// Load a catalog from JSON text.
///
/// Unlike `load_catalog_from_value`, this also rejects a node name repeated
/// among its siblings, which a parsed `Value` can no longer show.
pub fn load_catalog_from_str(
    text: &str,
    options: &LoadOptions,
) -> Result<Catalog, MalformedCatalogError> {
    let value: Value = serde_json::from_str(text)?;
    if let Some(path) = find_repeated_name(text) {
        return Err(MalformedCatalogError::node(path, NodeProblem::DuplicateName));
    }
    load_catalog_from_value(value, options)
}

pub fn load_catalog_from_value(
    value: Value,
    options: &LoadOptions,
) -> Result<Catalog, MalformedCatalogError> {
    let top_level = match &value {
        Value::Object(map) => map.len(),
        _ => {
            return Err(MalformedCatalogError::Root(
                "top level must be a JSON object".to_string(),
            ));
        }
    };
    if top_level != 1 {
        return Err(MalformedCatalogError::Root(format!(
            "expected exactly one top-level node, found {top_level}"
        )));
    }

    if options.schema_check {
        validate_against_schema(&value)?;
        debug!("catalog passed schema validation");
    }

    let raw: BTreeMap<String, RawNode> = serde_json::from_value(value)?;
    let Some((root_name, root_raw)) = raw.into_iter().next() else {
        return Err(MalformedCatalogError::Root("catalog is empty".to_string()));
    };
    if let Some(expected) = &options.root_name {
        if &root_name != expected {
            return Err(MalformedCatalogError::Root(format!(
                "expected root '{expected}', found '{root_name}'"
            )));
        }
    }

    let mut builder = ArenaBuilder::default();
    let root = builder.insert(root_name, root_raw, None)?;
    let catalog = Catalog {
        nodes: builder.nodes,
        root,
    };
    if !catalog.root().is_branch() {
        return Err(MalformedCatalogError::Root(format!(
            "root '{}' must be a branch, found {}",
            catalog.root().name(),
            catalog.root().kind()
        )));
    }

    let branches = catalog.nodes().filter(|node| node.is_branch()).count();
    info!(
        root = catalog.root().name(),
        nodes = catalog.len(),
        branches,
        signals = catalog.len() - branches,
        "loaded signal catalog"
    );
    Ok(catalog)
}

#[derive(Default)]
struct ArenaBuilder {
    nodes: Vec<Node>,
    // uuid -> path of the node that claimed it first
    uuids: HashMap<SignalUuid, String>,
}

impl ArenaBuilder {
    fn insert(
        &mut self,
        name: String,
        raw: RawNode,
        parent: Option<(NodeId, &str)>,
    ) -> Result<NodeId, MalformedCatalogError> {
        let path = match parent {
            Some((_, parent_path)) => format!("{parent_path}.{name}"),
            None => name.clone(),
        };
        if name.is_empty() || name.contains('.') {
            return Err(MalformedCatalogError::node(path, NodeProblem::InvalidName));
        }

        let kind = match raw.kind.as_deref() {
            None => return Err(MalformedCatalogError::node(path, NodeProblem::MissingKind)),
            Some(tag) => NodeKind::from_str(tag).ok_or_else(|| {
                MalformedCatalogError::node(&path, NodeProblem::UnknownKind(tag.to_string()))
            })?,
        };
        let uuid = self.claim_uuid(raw.uuid.as_deref(), &path)?;

        if let Some(note) = raw.deprecation.as_deref() {
            warn!(path = %path, deprecation = note, "catalog node is deprecated");
        }

        let id = NodeId::try_from_index(self.nodes.len()).ok_or(
            MalformedCatalogError::TooManyNodes {
                max: u32::MAX as usize + 1,
            },
        )?;
        if kind.is_branch() {
            if raw.datatype.is_some() {
                return Err(MalformedCatalogError::node(
                    path,
                    NodeProblem::BranchWithDatatype,
                ));
            }
            let Some(raw_children) = raw.children else {
                return Err(MalformedCatalogError::node(
                    path,
                    NodeProblem::BranchWithoutChildren,
                ));
            };

            self.nodes.push(Node {
                id,
                name,
                parent: parent.map(|(parent_id, _)| parent_id),
                uuid,
                description: raw.description.unwrap_or_default(),
                comment: raw.comment,
                deprecation: raw.deprecation,
                body: NodeBody::Branch {
                    children: BTreeMap::new(),
                },
            });

            let mut children = BTreeMap::new();
            for (child_name, child_raw) in raw_children {
                let child_id =
                    self.insert(child_name.clone(), child_raw, Some((id, path.as_str())))?;
                children.insert(child_name, child_id);
            }
            self.nodes[id.index()].body = NodeBody::Branch { children };
        } else {
            if raw.children.is_some() {
                return Err(MalformedCatalogError::node(
                    path,
                    NodeProblem::LeafWithChildren(kind),
                ));
            }
            let spec = signal_spec(kind, &raw, &path)?;
            self.nodes.push(Node {
                id,
                name,
                parent: parent.map(|(parent_id, _)| parent_id),
                uuid,
                description: raw.description.unwrap_or_default(),
                comment: raw.comment,
                deprecation: raw.deprecation,
                body: NodeBody::Signal(spec),
            });
        }
        Ok(id)
    }

    fn claim_uuid(
        &mut self,
        raw: Option<&str>,
        path: &str,
    ) -> Result<SignalUuid, MalformedCatalogError> {
        let Some(raw) = raw else {
            return Err(MalformedCatalogError::node(path, NodeProblem::MissingUuid));
        };
        let uuid = SignalUuid::parse(raw).ok_or_else(|| {
            MalformedCatalogError::node(path, NodeProblem::MalformedUuid(raw.to_string()))
        })?;
        if let Some(first_path) = self.uuids.get(&uuid) {
            return Err(MalformedCatalogError::node(
                path,
                NodeProblem::DuplicateUuid {
                    uuid: uuid.to_string(),
                    first_path: first_path.clone(),
                },
            ));
        }
        self.uuids.insert(uuid.clone(), path.to_string());
        Ok(uuid)
    }
}

fn signal_spec(
    kind: NodeKind,
    raw: &RawNode,
    path: &str,
) -> Result<SignalSpec, MalformedCatalogError> {
    let Some(raw_datatype) = raw.datatype.as_deref() else {
        return Err(MalformedCatalogError::node(
            path,
            NodeProblem::LeafWithoutDatatype(kind),
        ));
    };
    let datatype = Datatype::parse(raw_datatype).ok_or_else(|| {
        MalformedCatalogError::node(
            path,
            NodeProblem::UnknownDatatype(raw_datatype.to_string()),
        )
    })?;

    let has_bounds = raw.min.is_some() || raw.max.is_some();
    let constraint = match &raw.allowed {
        Some(_) if has_bounds => {
            return Err(MalformedCatalogError::node(
                path,
                NodeProblem::AllowedWithBounds,
            ));
        }
        Some(_) if !datatype.is_string() => {
            return Err(MalformedCatalogError::node(
                path,
                NodeProblem::AllowedOnNonString(datatype),
            ));
        }
        Some(values) => Constraint::Allowed(values.clone()),
        None if has_bounds && !datatype.is_numeric() => {
            return Err(MalformedCatalogError::node(
                path,
                NodeProblem::BoundsOnNonNumeric(datatype),
            ));
        }
        None if has_bounds => Constraint::Range {
            min: raw.min,
            max: raw.max,
        },
        None => Constraint::Unconstrained,
    };

    Ok(SignalSpec {
        kind,
        datatype,
        unit: raw.unit.clone(),
        constraint,
        default: raw.default.clone(),
    })
}

/// Path of the first node whose name repeats among its siblings.
///
/// Any other shape problem stops the scan early; the typed load reports it.
fn find_repeated_name(text: &str) -> Option<String> {
    let mut repeated = None;
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let scan = SiblingScan {
        parent: None,
        repeated: &mut repeated,
    };
    scan.deserialize(&mut deserializer).ok();
    repeated
}

// A `{name: node}` map: the top level or a branch's `children`.
struct SiblingScan<'a> {
    parent: Option<&'a str>,
    repeated: &'a mut Option<String>,
}

// One node object; only its `children` are walked.
struct NodeScan<'a> {
    path: &'a str,
    repeated: &'a mut Option<String>,
}

impl<'de> DeserializeSeed<'de> for SiblingScan<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_option(self)
    }
}

impl<'de> Visitor<'de> for SiblingScan<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of node names to nodes")
    }

    fn visit_none<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> Result<(), A::Error> {
        let mut seen = HashSet::new();
        while let Some(name) = map.next_key::<String>()? {
            let path = match self.parent {
                Some(parent) => format!("{parent}.{name}"),
                None => name.clone(),
            };
            if !seen.insert(name) {
                *self.repeated = Some(path);
                return Err(de::Error::custom("repeated node name"));
            }
            map.next_value_seed(NodeScan {
                path: &path,
                repeated: &mut *self.repeated,
            })?;
        }
        Ok(())
    }
}

impl<'de> DeserializeSeed<'de> for NodeScan<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for NodeScan<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a catalog node object")
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "children" {
                map.next_value_seed(SiblingScan {
                    parent: Some(self.path),
                    repeated: &mut *self.repeated,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}
