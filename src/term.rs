//! Projected term records
//!
//! The cache materializes terms in this trimmed form: only the fields the
//! validator consults survive the projection. The three dictionary roles are
//! independent presence flags, never a hierarchy: a term may be a descriptor,
//! a structure definition and an enumeration element at the same time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dictionary term as seen by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Globally unique term key.
    pub key: String,

    /// Data section: present iff the term is a descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Rule section: present iff the term is a structure definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<Value>,

    /// Enumeration path: non-empty iff the term is an enumeration element.
    /// Lists the type terms this element belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl Term {
    pub fn is_descriptor(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_structure(&self) -> bool {
        self.rule.is_some()
    }

    pub fn is_enumeration(&self) -> bool {
        self.path.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Whether the enumeration path contains the given type term.
    pub fn belongs_to(&self, enum_type: &str) -> bool {
        self.path
            .as_ref()
            .is_some_and(|p| p.iter().any(|t| t == enum_type))
    }
}

/// Scalar data types recognized inside a scalar dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Boolean,
    Integer,
    Number,
    Timestamp,
    String,
    Key,
    Handle,
    Enum,
    Date,
    Struct,
    Object,
    GeoJson,
}

impl ScalarType {
    /// Parse a type tag; `None` means the tag is unsupported.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "timestamp" => Some(Self::Timestamp),
            "string" => Some(Self::String),
            "key" => Some(Self::Key),
            "handle" => Some(Self::Handle),
            "enum" => Some(Self::Enum),
            "date" => Some(Self::Date),
            "struct" => Some(Self::Struct),
            "object" => Some(Self::Object),
            "geojson" => Some(Self::GeoJson),
            _ => None,
        }
    }
}
