//! In-memory representation of a loaded VSS catalog.
//!
//! `RawNode` mirrors the JSON export shape and is only used while loading.
//! The loaded form is an arena: `Catalog` owns a flat node table and nodes
//! refer to their parent and children by `NodeId`. Nothing mutates a
//! `Catalog` once the loader returns it.

use crate::catalog::identity::{Datatype, NodeKind, SignalUuid};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Deserialize)]
/// One node as written in the catalog file, before any validation.
pub struct RawNode {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub deprecation: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub children: Option<BTreeMap<String, RawNode>>,
}

/// Position of a node in the catalog's node table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// `None` once the table outgrows `u32`.
    pub(crate) fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(NodeId)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Value constraint declared on a signal. `allowed` and `min`/`max` never
/// appear together.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Unconstrained,
    Range { min: Option<f64>, max: Option<f64> },
    Allowed(Vec<String>),
}

#[derive(Clone, Debug)]
/// Leaf attributes of a sensor, actuator, or attribute node.
pub struct SignalSpec {
    pub kind: NodeKind,
    pub datatype: Datatype,
    pub unit: Option<String>,
    pub constraint: Constraint,
    pub default: Option<Value>,
}

#[derive(Clone, Debug)]
pub enum NodeBody {
    Branch { children: BTreeMap<String, NodeId> },
    Signal(SignalSpec),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) uuid: SignalUuid,
    pub(crate) description: String,
    pub(crate) comment: Option<String>,
    pub(crate) deprecation: Option<String>,
    pub(crate) body: NodeBody,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn uuid(&self) -> &SignalUuid {
        &self.uuid
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecation.as_deref()
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Branch { .. } => NodeKind::Branch,
            NodeBody::Signal(spec) => spec.kind,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.body, NodeBody::Branch { .. })
    }

    /// Leaf attributes; `None` for branches.
    pub fn signal(&self) -> Option<&SignalSpec> {
        match &self.body {
            NodeBody::Signal(spec) => Some(spec),
            NodeBody::Branch { .. } => None,
        }
    }

    /// Child ids keyed by name; `None` for leaves.
    pub fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.body {
            NodeBody::Branch { children } => Some(children),
            NodeBody::Signal(_) => None,
        }
    }

    pub fn datatype(&self) -> Option<Datatype> {
        self.signal().map(|spec| spec.datatype)
    }

    pub fn unit(&self) -> Option<&str> {
        self.signal().and_then(|spec| spec.unit.as_deref())
    }

    pub fn min(&self) -> Option<f64> {
        match self.signal().map(|spec| &spec.constraint) {
            Some(Constraint::Range { min, .. }) => *min,
            _ => None,
        }
    }

    pub fn max(&self) -> Option<f64> {
        match self.signal().map(|spec| &spec.constraint) {
            Some(Constraint::Range { max, .. }) => *max,
            _ => None,
        }
    }

    pub fn allowed(&self) -> Option<&[String]> {
        match self.signal().map(|spec| &spec.constraint) {
            Some(Constraint::Allowed(values)) => Some(values),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.signal().and_then(|spec| spec.default.as_ref())
    }

    /// Flatten the node into the JSON-friendly shape printed by the CLI helpers.
    pub fn summary(&self, path: String) -> NodeSummary<'_> {
        NodeSummary {
            path,
            name: &self.name,
            kind: self.kind(),
            uuid: &self.uuid,
            datatype: self.datatype(),
            unit: self.unit(),
            min: self.min(),
            max: self.max(),
            allowed: self.allowed(),
            default: self.default_value(),
            description: &self.description,
            comment: self.comment(),
            deprecation: self.deprecation(),
            children: self
                .children()
                .map(|children| children.keys().map(String::as_str).collect()),
        }
    }
}

#[derive(Debug, Serialize)]
/// Serializable view of a node together with its dotted path.
pub struct NodeSummary<'a> {
    pub path: String,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub uuid: &'a SignalUuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'a Value>,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<&'a str>>,
}

#[derive(Debug)]
/// Immutable signal tree backed by a flat node table.
pub struct Catalog {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Catalog {
    pub fn root(&self) -> &Node {
        self.node(self.root)
    }

    /// Ids only come from this catalog, so indexing cannot go out of bounds.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dotted path from the root to `id`, root name included.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            segments.push(node.name.as_str());
            cursor = node.parent;
        }
        segments.reverse();
        segments.join(".")
    }
}
