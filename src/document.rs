//! Top-level JSON:API document container.

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::describe::Resource;
use crate::error::DocumentError;
use crate::object::ResourceObject;
use crate::registry::Registry;

/// One candidate element of primary data.
pub enum Element {
    Resource(Arc<dyn ResourceObject>),
    /// A value of a type that is not a resource, kept only by type name.
    Foreign { type_name: &'static str },
}

impl Element {
    pub fn resource<T: Resource>(value: T) -> Self {
        Element::Resource(Arc::new(value))
    }

    /// Stand-in for a value whose type is not a resource. Such elements are
    /// rejected when assigned as primary data.
    pub fn foreign<T: ?Sized>() -> Self {
        Element::Foreign {
            type_name: type_name::<T>(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Element::Resource(object) => object.type_name(),
            Element::Foreign { type_name } => type_name,
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Resource(object) => f.debug_tuple("Resource").field(object).finish(),
            Element::Foreign { type_name } => f
                .debug_struct("Foreign")
                .field("type_name", type_name)
                .finish(),
        }
    }
}

/// Primary data as handed to a document, before validation.
#[derive(Debug)]
pub enum Data {
    Null,
    One(Element),
    Many(Vec<Element>),
}

impl Data {
    /// A single resource.
    pub fn one<T: Resource>(value: T) -> Self {
        Data::One(Element::resource(value))
    }

    /// A sequence of resources of one type.
    pub fn many<T: Resource>(values: impl IntoIterator<Item = T>) -> Self {
        Data::Many(values.into_iter().map(Element::resource).collect())
    }
}

/// Validated primary data.
#[derive(Debug, Clone)]
pub enum PrimaryData {
    One(Arc<dyn ResourceObject>),
    Many(Vec<Arc<dyn ResourceObject>>),
}

impl PrimaryData {
    /// Iterate the contained resources.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceObject>> {
        let items: &[Arc<dyn ResourceObject>] = match self {
            PrimaryData::One(object) => std::slice::from_ref(object),
            PrimaryData::Many(objects) => objects,
        };
        items.iter()
    }

    pub fn is_many(&self) -> bool {
        matches!(self, PrimaryData::Many(_))
    }

    fn validate(data: Data) -> Result<Self, DocumentError> {
        match data {
            Data::Null => Err(DocumentError::UnsupportedPayload {
                message: "data is null".to_string(),
            }),
            Data::One(Element::Resource(object)) => Ok(PrimaryData::One(object)),
            Data::One(element) => Err(DocumentError::UnsupportedPayload {
                message: format!(
                    "data (type: {}) is not a resource type",
                    element.type_name()
                ),
            }),
            Data::Many(elements) => {
                let mut objects: Vec<Arc<dyn ResourceObject>> =
                    Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        Element::Resource(object) => {
                            if let Some(first) = objects.first() {
                                if first.resource_type_id() != object.resource_type_id() {
                                    return Err(DocumentError::UnsupportedPayload {
                                        message: format!(
                                            "data mixes resource types {} and {}",
                                            first.type_name(),
                                            object.type_name()
                                        ),
                                    });
                                }
                            }
                            objects.push(object);
                        }
                        Element::Foreign { type_name } => {
                            return Err(DocumentError::UnsupportedPayload {
                                message: format!(
                                    "data contains an element (type: {type_name}) that is not a resource type"
                                ),
                            })
                        }
                    }
                }
                Ok(PrimaryData::Many(objects))
            }
        }
    }
}

impl PartialEq for PrimaryData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PrimaryData::One(a), PrimaryData::One(b)) => **a == **b,
            (PrimaryData::Many(a), PrimaryData::Many(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| **a == **b)
            }
            _ => false,
        }
    }
}

/// A JSON:API document: primary data, included resources, links and meta.
///
/// Included resources are deduplicated by `(type, identity)`; including
/// the same pair again replaces the stored resource.
pub struct Document {
    registry: Arc<Registry>,
    data: Option<PrimaryData>,
    included: HashMap<TypeId, HashMap<String, Arc<dyn ResourceObject>>>,
    links: BTreeMap<String, String>,
    meta: BTreeMap<String, Value>,
}

impl Document {
    /// Create a document around primary data.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnsupportedPayload` if `data` is null, is a
    /// non-resource value, or is a sequence with a non-resource element.
    pub fn new(registry: Arc<Registry>, data: Data) -> Result<Self, DocumentError> {
        let data = PrimaryData::validate(data)?;
        Ok(Self {
            data: Some(data),
            ..Self::empty(registry)
        })
    }

    /// Create a document without primary data, e.g. for meta-only responses.
    pub fn empty(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            data: None,
            included: HashMap::new(),
            links: BTreeMap::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn data(&self) -> Option<&PrimaryData> {
        self.data.as_ref()
    }

    /// Replace the primary data, validating it as [`new`](Self::new) does.
    /// The previous data is kept if validation fails.
    pub fn set_data(&mut self, data: Data) -> Result<(), DocumentError> {
        self.data = Some(PrimaryData::validate(data)?);
        Ok(())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Include a secondary resource.
    pub fn include<T: Resource>(&mut self, object: T) -> Result<(), DocumentError> {
        self.include_object(Arc::new(object))
    }

    /// Include an already shared resource.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Extract` if the resource's identity cannot
    /// be read.
    pub fn include_object(&mut self, object: Arc<dyn ResourceObject>) -> Result<(), DocumentError> {
        let identity = object.identity(&self.registry)?;
        let key = identity.to_string();
        let replaced = self
            .included
            .entry(object.resource_type_id())
            .or_default()
            .insert(key, Arc::clone(&object))
            .is_some();
        debug!(
            resource_type = object.resource_type(),
            id = %identity,
            replaced,
            "included resource"
        );
        Ok(())
    }

    /// Include every resource in order; later duplicates win.
    pub fn include_all<T: Resource>(
        &mut self,
        objects: impl IntoIterator<Item = T>,
    ) -> Result<(), DocumentError> {
        for object in objects {
            self.include(object)?;
        }
        Ok(())
    }

    /// All included resources, one per `(type, identity)`, in no
    /// particular order.
    pub fn flatten_includes(&self) -> Vec<Arc<dyn ResourceObject>> {
        self.included
            .values()
            .flat_map(|objects| objects.values().cloned())
            .collect()
    }

    pub fn links(&self) -> &BTreeMap<String, String> {
        &self.links
    }

    pub fn meta(&self) -> &BTreeMap<String, Value> {
        &self.meta
    }

    /// Add or replace a top-level link.
    pub fn add_link(&mut self, key: impl Into<String>, href: impl Into<String>) {
        self.links.insert(key.into(), href.into());
    }

    /// Add or replace a top-level meta entry.
    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("data", &self.data)
            .field("included", &self.included.values().map(HashMap::len).sum::<usize>())
            .field("links", &self.links)
            .field("meta", &self.meta)
            .finish()
    }
}

/// Documents compare by data, links and meta. Included resources are not
/// part of equality.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.links == other.links && self.meta == other.meta
    }
}
