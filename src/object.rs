//! Object-safe view of resource instances.
//!
//! Documents hold heterogeneous resources, so they work through
//! [`ResourceObject`], which every [`Resource`] implements.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use serde_json::Value;

use crate::describe::Resource;
use crate::error::ExtractError;
use crate::extract::{extract, Contribution};
use crate::registry::Registry;
use crate::types::Category;

pub trait ResourceObject: Send + Sync + fmt::Debug + 'static {
    /// JSON:API type discriminator.
    fn resource_type(&self) -> &'static str;

    /// Rust type name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    fn resource_type_id(&self) -> TypeId;

    fn as_any(&self) -> &dyn Any;

    /// Read the identity value through the registry.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Configuration` if the type declares no
    /// identity member.
    fn identity(&self, registry: &Registry) -> Result<Value, ExtractError>;

    fn extract(&self, registry: &Registry, category: Category)
        -> Result<Contribution, ExtractError>;

    /// Equality across the erased boundary: same concrete type and equal.
    fn dyn_eq(&self, other: &dyn ResourceObject) -> bool;
}

impl<T: Resource> ResourceObject for T {
    fn resource_type(&self) -> &'static str {
        T::TYPE
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn resource_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn identity(&self, registry: &Registry) -> Result<Value, ExtractError> {
        let accessor =
            registry
                .identity_accessor::<T>()?
                .ok_or_else(|| ExtractError::Configuration {
                    type_name: type_name::<T>(),
                    member: String::new(),
                    message: "no member is marked identity".to_string(),
                })?;
        accessor
            .read(self)
            .map_err(|source| ExtractError::Access {
                type_name: type_name::<T>(),
                member: accessor.member().to_string(),
                source,
            })
    }

    fn extract(
        &self,
        registry: &Registry,
        category: Category,
    ) -> Result<Contribution, ExtractError> {
        extract(registry, self, category)
    }

    fn dyn_eq(&self, other: &dyn ResourceObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

impl PartialEq for dyn ResourceObject {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::describe::Describe;

    #[derive(Debug, PartialEq)]
    struct Tag {
        id: String,
    }

    impl Resource for Tag {
        const TYPE: &'static str = "tag";

        fn describe(d: &mut Describe<Self>) {
            d.field("id", |t| &t.id).identity();
        }
    }

    #[derive(Debug, PartialEq)]
    struct Note {
        body: String,
    }

    impl Resource for Note {
        const TYPE: &'static str = "note";

        fn describe(d: &mut Describe<Self>) {
            d.field("body", |n| &n.body).attribute();
        }
    }

    #[test]
    fn erased_identity() {
        let registry = Registry::new();
        let tag: Box<dyn ResourceObject> = Box::new(Tag { id: "t1".into() });
        assert_eq!(tag.identity(&registry).unwrap(), json!("t1"));
        assert_eq!(tag.resource_type(), "tag");
        assert!(tag.type_name().ends_with("Tag"));
    }

    #[test]
    fn missing_identity_is_configuration_error() {
        let registry = Registry::new();
        let note = Note { body: "x".into() };
        let err = ResourceObject::identity(&note, &registry).unwrap_err();
        assert!(matches!(err, ExtractError::Configuration { .. }));
    }

    #[test]
    fn erased_equality() {
        let a: Box<dyn ResourceObject> = Box::new(Tag { id: "t1".into() });
        let b: Box<dyn ResourceObject> = Box::new(Tag { id: "t1".into() });
        let c: Box<dyn ResourceObject> = Box::new(Tag { id: "t2".into() });
        let d: Box<dyn ResourceObject> = Box::new(Note { body: "t1".into() });
        assert!(*a == *b);
        assert!(*a != *c);
        assert!(*a != *d);
    }
}
