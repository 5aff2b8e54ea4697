//! Per-type descriptor cache.
//!
//! A [`Registry`] resolves each resource type's declarations once, fixes how
//! every member is read, and keeps the result for its own lifetime.
//! Descriptors are never invalidated.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::describe::{Describe, Flattened, MemberDecl, MemberKind, ReadFn, Resource, WriteFn};
use crate::error::{AccessFailure, ExtractError};
use crate::types::{Category, Marker};

/// Read (and optionally write) access to one member of `T`.
pub struct Accessor<T> {
    member: String,
    read: ReadFn<T>,
    write: Option<WriteFn<T>>,
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self {
            member: self.member.clone(),
            read: Arc::clone(&self.read),
            write: self.write.clone(),
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("member", &self.member)
            .field("writable", &self.write.is_some())
            .finish()
    }
}

impl<T> Accessor<T> {
    /// Name of the member this accessor serves.
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn read(&self, target: &T) -> Result<Value, AccessFailure> {
        (self.read)(target)
    }

    /// Write through the member's `set_<name>` setter.
    pub fn write(&self, target: &mut T, value: Value) -> Result<(), AccessFailure> {
        match &self.write {
            Some(write) => write(target, value),
            None => Err(AccessFailure::ReadOnly),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }
}

pub(crate) enum ReadStrategy<T> {
    Direct(ReadFn<T>),
    Getter { name: String, read: ReadFn<T> },
    Missing { tried: Vec<String> },
}

/// Resolved metadata for one declared member.
pub struct MemberDescriptor<T> {
    name: String,
    kind: MemberKind,
    markers: Vec<Marker>,
    serialized: Option<Option<String>>,
    strategy: ReadStrategy<T>,
}

impl<T> fmt::Debug for MemberDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match &self.strategy {
            ReadStrategy::Direct(_) => "direct".to_string(),
            ReadStrategy::Getter { name, .. } => name.clone(),
            ReadStrategy::Missing { .. } => "missing".to_string(),
        };
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("markers", &self.markers)
            .field("serialized", &self.serialized)
            .field("read", &strategy)
            .finish()
    }
}

impl<T> MemberDescriptor<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn has_marker(&self, category: Category) -> bool {
        self.markers.iter().any(|m| m.category == category)
    }

    /// First marker admitted by the requested category.
    pub fn marker_for(&self, requested: Category) -> Option<&Marker> {
        self.markers.iter().find(|m| requested.admits(m.category))
    }

    /// Whether the generic serialization marker is present.
    pub fn is_serialized(&self) -> bool {
        self.serialized.is_some()
    }

    /// Name carried by the generic serialization marker, if non-empty.
    pub fn serialized_name(&self) -> Option<&str> {
        self.serialized
            .as_ref()
            .and_then(|name| name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Whether a value can be read from this member at all.
    pub fn is_readable(&self) -> bool {
        !matches!(self.strategy, ReadStrategy::Missing { .. })
    }

    fn read_fn(&self) -> Option<&ReadFn<T>> {
        match &self.strategy {
            ReadStrategy::Direct(read) | ReadStrategy::Getter { read, .. } => Some(read),
            ReadStrategy::Missing { .. } => None,
        }
    }

    pub(crate) fn read(&self, target: &T, type_name: &'static str) -> Result<Value, ExtractError> {
        let read = self.read_fn().ok_or_else(|| self.missing_accessor(type_name))?;
        read(target).map_err(|source| ExtractError::Access {
            type_name,
            member: self.name.clone(),
            source,
        })
    }

    fn missing_accessor(&self, type_name: &'static str) -> ExtractError {
        let tried = match &self.strategy {
            ReadStrategy::Missing { tried } => tried.join(", "),
            _ => String::new(),
        };
        ExtractError::Configuration {
            type_name,
            member: self.name.clone(),
            message: format!("field has no direct read and none of [{tried}] is declared"),
        }
    }
}

/// Everything known about one resource type.
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    resource_type: &'static str,
    fields: Vec<MemberDescriptor<T>>,
    methods: Vec<MemberDescriptor<T>>,
    identity: Option<Accessor<T>>,
    attributes: HashMap<String, Accessor<T>>,
    catch_all: bool,
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("resource_type", &self.resource_type)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("identity", &self.identity)
            .field("catch_all", &self.catch_all)
            .finish()
    }
}

impl<T: Resource> TypeDescriptor<T> {
    /// Run `T::describe` and fix an accessor for every member.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Configuration` if an identity or attribute
    /// member has no way to be read.
    pub(crate) fn resolve() -> Result<Self, ExtractError> {
        let type_name = type_name::<T>();
        let mut describe = Describe::<T>::new();
        T::describe(&mut describe);
        let Flattened {
            fields,
            methods,
            getters,
            setters,
            catch_all,
        } = describe.flatten();

        let resolve_member = |decl: MemberDecl<T>| {
            let strategy = match decl.read {
                Some(read) => ReadStrategy::Direct(read),
                None => find_getter(&getters, &decl.name, decl.boolean),
            };
            MemberDescriptor {
                name: decl.name,
                kind: decl.kind,
                markers: decl.markers,
                serialized: decl.serialized,
                strategy,
            }
        };
        let fields: Vec<_> = fields.into_iter().map(resolve_member).collect();
        let methods: Vec<_> = methods.into_iter().map(resolve_member).collect();

        let mut identity: Option<Accessor<T>> = None;
        let mut attributes = HashMap::new();

        for member in fields.iter().chain(methods.iter()) {
            let is_identity = member.has_marker(Category::Identity);
            let is_attribute = member.has_marker(Category::Attribute);
            if !(is_identity || is_attribute) {
                continue;
            }

            let read = member
                .read_fn()
                .ok_or_else(|| member.missing_accessor(type_name))?;
            let setter_name = format!("set_{}", member.name);
            let accessor = Accessor {
                member: member.name.clone(),
                read: Arc::clone(read),
                write: setters
                    .iter()
                    .find(|(name, _)| *name == setter_name)
                    .map(|(_, write)| Arc::clone(write)),
            };

            if is_identity {
                if let Some(previous) = &identity {
                    warn!(
                        type_name,
                        previous = previous.member(),
                        member = member.name(),
                        "multiple identity members declared, last one wins"
                    );
                }
                identity = Some(accessor.clone());
            }
            if is_attribute {
                attributes.insert(member.name.clone(), accessor);
            }
        }

        debug!(
            type_name,
            resource_type = T::TYPE,
            fields = fields.len(),
            methods = methods.len(),
            attributes = attributes.len(),
            has_identity = identity.is_some(),
            "resolved resource descriptor"
        );

        Ok(Self {
            type_name,
            resource_type: T::TYPE,
            fields,
            methods,
            identity,
            attributes,
            catch_all,
        })
    }
}

impl<T> TypeDescriptor<T> {
    /// Rust type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// JSON:API type discriminator.
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Fields, concrete type first, then ancestors.
    pub fn fields(&self) -> &[MemberDescriptor<T>] {
        &self.fields
    }

    /// Methods, concrete type first, then ancestors.
    pub fn methods(&self) -> &[MemberDescriptor<T>] {
        &self.methods
    }

    pub fn identity(&self) -> Option<&Accessor<T>> {
        self.identity.as_ref()
    }

    /// Attribute accessor by member name (not by rendered key).
    pub fn attribute(&self, name: &str) -> Option<&Accessor<T>> {
        self.attributes.get(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Whether the type opted in to catch-all extraction.
    pub fn catch_all(&self) -> bool {
        self.catch_all
    }
}

fn find_getter<T>(levels: &[Vec<(String, ReadFn<T>)>], member: &str, boolean: bool) -> ReadStrategy<T> {
    let mut candidates = vec![format!("get_{member}")];
    if boolean {
        candidates.push(format!("is_{member}"));
    }

    for level in levels {
        for candidate in &candidates {
            if let Some((name, read)) = level.iter().find(|(name, _)| name == candidate) {
                return ReadStrategy::Getter {
                    name: name.clone(),
                    read: Arc::clone(read),
                };
            }
        }
    }

    ReadStrategy::Missing { tried: candidates }
}

/// Process-lifetime cache of resolved resource descriptors.
///
/// Thread-safe. Concurrent first resolutions of the same type all receive
/// the descriptor that was stored first.
#[derive(Default)]
pub struct Registry {
    types: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.len())
            .finish()
    }
}

impl Registry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `T` eagerly.
    ///
    /// Equivalent to [`descriptor`](Self::descriptor); use it to surface
    /// declaration defects at startup rather than on first use.
    pub fn register<T: Resource>(&self) -> Result<Arc<TypeDescriptor<T>>, ExtractError> {
        self.descriptor::<T>()
    }

    /// Cached descriptor for `T`, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Configuration` if `T`'s declarations are
    /// defective. Nothing is cached in that case.
    pub fn descriptor<T: Resource>(&self) -> Result<Arc<TypeDescriptor<T>>, ExtractError> {
        if let Some(found) = self.lookup::<T>() {
            return found;
        }

        let built: Arc<dyn Any + Send + Sync> = Arc::new(TypeDescriptor::<T>::resolve()?);

        let stored = {
            let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
            Arc::clone(types.entry(TypeId::of::<T>()).or_insert_with(|| Arc::clone(&built)))
        };
        if !Arc::ptr_eq(&stored, &built) {
            debug!(
                type_name = type_name::<T>(),
                "descriptor resolved concurrently, keeping the stored one"
            );
        }

        downcast::<T>(stored)
    }

    /// Identity accessor of `T`, or `None` if no member is marked identity.
    pub fn identity_accessor<T: Resource>(&self) -> Result<Option<Accessor<T>>, ExtractError> {
        Ok(self.descriptor::<T>()?.identity().cloned())
    }

    /// Attribute accessor of `T` by member name, or `None` if not declared.
    pub fn attribute_accessor<T: Resource>(
        &self,
        name: &str,
    ) -> Result<Option<Accessor<T>>, ExtractError> {
        Ok(self.descriptor::<T>()?.attribute(name).cloned())
    }

    pub fn is_registered<T: Resource>(&self) -> bool {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.contains_key(&TypeId::of::<T>())
    }

    /// Number of resolved types.
    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T: Resource>(&self) -> Option<Result<Arc<TypeDescriptor<T>>, ExtractError>> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types
            .get(&TypeId::of::<T>())
            .map(|stored| downcast::<T>(Arc::clone(stored)))
    }
}

fn downcast<T: Resource>(
    stored: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<TypeDescriptor<T>>, ExtractError> {
    stored
        .downcast::<TypeDescriptor<T>>()
        .map_err(|_| ExtractError::Configuration {
            type_name: type_name::<T>(),
            member: String::new(),
            message: "registry entry holds a descriptor of another type".to_string(),
        })
}
