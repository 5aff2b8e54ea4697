//! Relationship linkage values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A to-one relationship reference that does not embed the related resource.
///
/// Serializes as `{"data": {"id": ..., "type": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linkage {
    data: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Identifier {
    id: Value,
    #[serde(rename = "type")]
    resource_type: String,
}

impl Linkage {
    pub fn new(id: impl Into<Value>, resource_type: impl Into<String>) -> Self {
        Self {
            data: Identifier {
                id: id.into(),
                resource_type: resource_type.into(),
            },
        }
    }

    pub fn id(&self) -> &Value {
        &self.data.id
    }

    pub fn resource_type(&self) -> &str {
        &self.data.resource_type
    }
}

/// Value contributed by one member to a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MemberValue {
    Json(Value),
    Linkage(Linkage),
}

impl MemberValue {
    /// Returns the plain JSON value, if this is not a linkage.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MemberValue::Json(value) => Some(value),
            MemberValue::Linkage(_) => None,
        }
    }

    /// Returns the linkage, if this is one.
    pub fn as_linkage(&self) -> Option<&Linkage> {
        match self {
            MemberValue::Linkage(linkage) => Some(linkage),
            MemberValue::Json(_) => None,
        }
    }

    /// Convert into the JSON shape an encoder would emit.
    pub fn into_value(self) -> Value {
        match self {
            MemberValue::Json(value) => value,
            MemberValue::Linkage(linkage) => serde_json::json!({
                "data": { "id": linkage.data.id, "type": linkage.data.resource_type }
            }),
        }
    }
}

impl From<Value> for MemberValue {
    fn from(value: Value) -> Self {
        MemberValue::Json(value)
    }
}

impl From<Linkage> for MemberValue {
    fn from(linkage: Linkage) -> Self {
        MemberValue::Linkage(linkage)
    }
}
