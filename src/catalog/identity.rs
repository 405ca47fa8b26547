use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Label for one loaded catalog release (e.g., `vss-4.0`).
///
/// Used by `CatalogRepository` so callers pick the catalog a signal is
/// resolved against explicitly.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable 32-hex-character identifier of a catalog node.
///
/// Always stored lowercase; construct through `SignalUuid::parse` so lookups
/// and duplicate detection are case-insensitive.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct SignalUuid(String);

pub const UUID_LEN: usize = 32;

impl SignalUuid {
    /// Accepts exactly 32 ASCII hex digits, in either case.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == UUID_LEN && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node variant tag, serialized under the catalog's `type` key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NodeKind {
    Branch,
    Sensor,
    Actuator,
    Attribute,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Branch,
        NodeKind::Sensor,
        NodeKind::Actuator,
        NodeKind::Attribute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Branch => "branch",
            NodeKind::Sensor => "sensor",
            NodeKind::Actuator => "actuator",
            NodeKind::Attribute => "attribute",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "branch" => Some(NodeKind::Branch),
            "sensor" => Some(NodeKind::Sensor),
            "actuator" => Some(NodeKind::Actuator),
            "attribute" => Some(NodeKind::Attribute),
            _ => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, NodeKind::Branch)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown node type '{value}'")))
    }
}

/// Scalar element type of a signal datatype.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScalarType {
    Boolean,
    String,
    Float,
    Double,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::String => "string",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Int8 => "int8",
            ScalarType::UInt8 => "uint8",
            ScalarType::Int16 => "int16",
            ScalarType::UInt16 => "uint16",
            ScalarType::Int32 => "int32",
            ScalarType::UInt32 => "uint32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt64 => "uint64",
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "boolean" => Some(ScalarType::Boolean),
            "string" => Some(ScalarType::String),
            "float" => Some(ScalarType::Float),
            "double" => Some(ScalarType::Double),
            "int8" => Some(ScalarType::Int8),
            "uint8" => Some(ScalarType::UInt8),
            "int16" => Some(ScalarType::Int16),
            "uint16" => Some(ScalarType::UInt16),
            "int32" => Some(ScalarType::Int32),
            "uint32" => Some(ScalarType::UInt32),
            "int64" => Some(ScalarType::Int64),
            "uint64" => Some(ScalarType::UInt64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarType::Boolean | ScalarType::String)
    }

    pub fn is_integer(&self) -> bool {
        self.integer_range().is_some()
    }

    /// Inclusive representable range for integer types.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            ScalarType::Int8 => (i8::MIN as i128, i8::MAX as i128),
            ScalarType::UInt8 => (0, u8::MAX as i128),
            ScalarType::Int16 => (i16::MIN as i128, i16::MAX as i128),
            ScalarType::UInt16 => (0, u16::MAX as i128),
            ScalarType::Int32 => (i32::MIN as i128, i32::MAX as i128),
            ScalarType::UInt32 => (0, u32::MAX as i128),
            ScalarType::Int64 => (i64::MIN as i128, i64::MAX as i128),
            ScalarType::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }
}

/// Declared datatype of a signal: a scalar type, optionally in array form
/// (`uint8[]`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Datatype {
    pub scalar: ScalarType,
    pub array: bool,
}

impl Datatype {
    pub const fn scalar(scalar: ScalarType) -> Self {
        Self {
            scalar,
            array: false,
        }
    }

    pub const fn array_of(scalar: ScalarType) -> Self {
        Self {
            scalar,
            array: true,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.strip_suffix("[]") {
            Some(element) => ScalarType::from_str(element).map(Self::array_of),
            None => ScalarType::from_str(raw).map(Self::scalar),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.scalar.is_numeric()
    }

    pub fn is_string(&self) -> bool {
        matches!(self.scalar, ScalarType::String)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.array {
            write!(f, "{}[]", self.scalar.as_str())
        } else {
            f.write_str(self.scalar.as_str())
        }
    }
}

impl Serialize for Datatype {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Datatype {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown datatype '{value}'")))
    }
}
