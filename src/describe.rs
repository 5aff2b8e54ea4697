//! Declaring which members of a type play which document role.
//!
//! A type opts in by implementing [`Resource`]. Its `describe` function
//! lists fields and methods in declaration order and attaches category
//! markers to them:
//!
//! ```
//! use jsonapi_doc::{Describe, Resource};
//!
//! #[derive(Debug, PartialEq)]
//! struct Person {
//!     id: u64,
//!     name: String,
//!     manager_id: u64,
//! }
//!
//! impl Resource for Person {
//!     const TYPE: &'static str = "person";
//!
//!     fn describe(d: &mut Describe<Self>) {
//!         d.field("id", |p| &p.id).identity();
//!         d.field("name", |p| &p.name).attribute_as("full_name");
//!         d.field("manager_id", |p| &p.manager_id).to_one_as("person", "manager");
//!         d.method("initial", |p| p.name.chars().next()).meta();
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt::{self, Display};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AccessFailure;
use crate::types::{Category, Marker};

pub(crate) type ReadFn<T> = Arc<dyn Fn(&T) -> Result<Value, AccessFailure> + Send + Sync>;
pub(crate) type WriteFn<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), AccessFailure> + Send + Sync>;

type Project<T, P> = Arc<dyn for<'a> Fn(&'a T) -> &'a P + Send + Sync>;
type ProjectMut<T, P> = Arc<dyn for<'a> Fn(&'a mut T) -> &'a mut P + Send + Sync>;

/// A domain type that can appear as primary or included data.
///
/// Implementing this trait is what makes a type a resource type.
pub trait Resource: Any + Send + Sync + PartialEq + fmt::Debug {
    /// Type discriminator emitted as `"type"`.
    const TYPE: &'static str;

    /// Declare members and their markers.
    fn describe(d: &mut Describe<Self>)
    where
        Self: Sized;
}

/// Whether a member was declared as a field or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

pub(crate) struct MemberDecl<T> {
    pub(crate) name: String,
    pub(crate) kind: MemberKind,
    /// `None` for private fields, which must be read through a getter.
    pub(crate) read: Option<ReadFn<T>>,
    pub(crate) markers: Vec<Marker>,
    /// Generic serialization marker, with its optional name.
    pub(crate) serialized: Option<Option<String>>,
    pub(crate) boolean: bool,
}

impl<T> MemberDecl<T> {
    fn new(name: &str, kind: MemberKind, read: Option<ReadFn<T>>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            read,
            markers: Vec::new(),
            serialized: None,
            boolean: false,
        }
    }
}

/// Members of one type with its ancestors folded in, child first.
pub(crate) struct Flattened<T> {
    pub(crate) fields: Vec<MemberDecl<T>>,
    pub(crate) methods: Vec<MemberDecl<T>>,
    /// Getters grouped by ancestry level, concrete type first.
    pub(crate) getters: Vec<Vec<(String, ReadFn<T>)>>,
    pub(crate) setters: Vec<(String, WriteFn<T>)>,
    pub(crate) catch_all: bool,
}

/// Declaration sink handed to [`Resource::describe`].
pub struct Describe<T> {
    members: Vec<MemberDecl<T>>,
    getters: Vec<(String, ReadFn<T>)>,
    setters: Vec<(String, WriteFn<T>)>,
    catch_all: bool,
    ancestors: Vec<Flattened<T>>,
}

impl<T: 'static> Describe<T> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
            getters: Vec::new(),
            setters: Vec::new(),
            catch_all: false,
            ancestors: Vec::new(),
        }
    }

    /// Declare a field that can be read directly.
    pub fn field<V, F>(&mut self, name: &str, read: F) -> MemberBuilder<'_, T>
    where
        V: Serialize + ?Sized,
        F: for<'a> Fn(&'a T) -> &'a V + Send + Sync + 'static,
    {
        let read: ReadFn<T> =
            Arc::new(move |t: &T| serde_json::to_value(read(t)).map_err(AccessFailure::Encode));
        self.push(MemberDecl::new(name, MemberKind::Field, Some(read)))
    }

    /// Declare a field with no direct read.
    ///
    /// Its value comes from a `get_<name>` getter, or `is_<name>` when the
    /// member is flagged [`MemberBuilder::boolean`].
    pub fn private_field(&mut self, name: &str) -> MemberBuilder<'_, T> {
        self.push(MemberDecl::new(name, MemberKind::Field, None))
    }

    /// Declare a method computing a value.
    pub fn method<V, F>(&mut self, name: &str, f: F) -> MemberBuilder<'_, T>
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let read: ReadFn<T> =
            Arc::new(move |t: &T| serde_json::to_value(f(t)).map_err(AccessFailure::Encode));
        self.push(MemberDecl::new(name, MemberKind::Method, Some(read)))
    }

    /// Declare a method whose invocation can fail.
    pub fn try_method<V, E, F>(&mut self, name: &str, f: F) -> MemberBuilder<'_, T>
    where
        V: Serialize,
        E: Display,
        F: Fn(&T) -> Result<V, E> + Send + Sync + 'static,
    {
        let read: ReadFn<T> = Arc::new(move |t: &T| {
            let value = f(t).map_err(|e| AccessFailure::Invoke(e.to_string()))?;
            serde_json::to_value(value).map_err(AccessFailure::Encode)
        });
        self.push(MemberDecl::new(name, MemberKind::Method, Some(read)))
    }

    /// Declare a conventionally named getter (`get_x` or `is_x`).
    ///
    /// Getters are not members themselves; they serve private fields and
    /// the descriptor cache.
    pub fn getter<V, F>(&mut self, name: &str, f: F) -> &mut Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let read: ReadFn<T> =
            Arc::new(move |t: &T| serde_json::to_value(f(t)).map_err(AccessFailure::Encode));
        self.getters.push((name.to_string(), read));
        self
    }

    /// Declare a conventionally named setter (`set_x`).
    pub fn setter<V, F>(&mut self, name: &str, f: F) -> &mut Self
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let write: WriteFn<T> = Arc::new(move |t: &mut T, value: Value| {
            let value = serde_json::from_value(value).map_err(AccessFailure::Decode)?;
            f(t, value);
            Ok(())
        });
        self.setters.push((name.to_string(), write));
        self
    }

    /// Opt in to catch-all extraction of members carrying only the generic
    /// serialization marker.
    pub fn catch_all(&mut self) -> &mut Self {
        self.catch_all = true;
        self
    }

    /// Fold in the members of an embedded parent resource.
    ///
    /// Parent members are visited after this type's own members. A parent
    /// member with the same kind and name as one already declared is
    /// shadowed.
    pub fn inherit<P, F, G>(&mut self, project: F, project_mut: G) -> &mut Self
    where
        P: Resource,
        F: for<'a> Fn(&'a T) -> &'a P + Send + Sync + 'static,
        G: for<'a> Fn(&'a mut T) -> &'a mut P + Send + Sync + 'static,
    {
        let mut parent = Describe::<P>::new();
        P::describe(&mut parent);
        let parent = parent.flatten();

        let project: Project<T, P> = Arc::new(project);
        let project_mut: ProjectMut<T, P> = Arc::new(project_mut);

        let lift_member = |decl: MemberDecl<P>| MemberDecl {
            name: decl.name,
            kind: decl.kind,
            read: decl.read.map(|read| lift_read(read, &project)),
            markers: decl.markers,
            serialized: decl.serialized,
            boolean: decl.boolean,
        };

        self.ancestors.push(Flattened {
            fields: parent.fields.into_iter().map(lift_member).collect(),
            methods: parent.methods.into_iter().map(lift_member).collect(),
            getters: parent
                .getters
                .into_iter()
                .map(|level| {
                    level
                        .into_iter()
                        .map(|(name, read)| (name, lift_read(read, &project)))
                        .collect()
                })
                .collect(),
            setters: parent
                .setters
                .into_iter()
                .map(|(name, write)| (name, lift_write(write, &project_mut)))
                .collect(),
            catch_all: parent.catch_all,
        });
        self
    }

    fn push(&mut self, decl: MemberDecl<T>) -> MemberBuilder<'_, T> {
        let index = self.members.len();
        self.members.push(decl);
        MemberBuilder {
            decl: &mut self.members[index],
        }
    }

    pub(crate) fn flatten(self) -> Flattened<T> {
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        for decl in self.members {
            match decl.kind {
                MemberKind::Field => fields.push(decl),
                MemberKind::Method => methods.push(decl),
            }
        }

        let mut getters = vec![self.getters];
        let mut setters = self.setters;
        for ancestor in self.ancestors {
            for decl in ancestor.fields {
                if !fields.iter().any(|f| f.name == decl.name) {
                    fields.push(decl);
                }
            }
            for decl in ancestor.methods {
                if !methods.iter().any(|m| m.name == decl.name) {
                    methods.push(decl);
                }
            }
            getters.extend(ancestor.getters);
            setters.extend(ancestor.setters);
        }

        Flattened {
            fields,
            methods,
            getters,
            setters,
            catch_all: self.catch_all,
        }
    }
}

fn lift_read<T: 'static, P: 'static>(read: ReadFn<P>, project: &Project<T, P>) -> ReadFn<T> {
    let project = Arc::clone(project);
    Arc::new(move |t: &T| read(project(t)))
}

fn lift_write<T: 'static, P: 'static>(
    write: WriteFn<P>,
    project_mut: &ProjectMut<T, P>,
) -> WriteFn<T> {
    let project_mut = Arc::clone(project_mut);
    Arc::new(move |t: &mut T, value: Value| write(project_mut(t), value))
}

/// Attaches markers to the member just declared.
pub struct MemberBuilder<'d, T> {
    decl: &'d mut MemberDecl<T>,
}

impl<'d, T> MemberBuilder<'d, T> {
    /// Attach a marker of any category.
    pub fn mark(self, marker: Marker) -> Self {
        let marker = if marker.category.accepts_key() {
            marker
        } else {
            Marker::new(marker.category)
        };
        self.decl.markers.push(marker);
        self
    }

    fn category(self, category: Category, key: Option<&str>) -> Self {
        let mut marker = Marker::new(category);
        if let Some(key) = key {
            marker = marker.key(key);
        }
        self.mark(marker)
    }

    pub fn identity(self) -> Self {
        self.category(Category::Identity, None)
    }

    pub fn attribute(self) -> Self {
        self.category(Category::Attribute, None)
    }

    pub fn attribute_as(self, key: &str) -> Self {
        self.category(Category::Attribute, Some(key))
    }

    pub fn link(self) -> Self {
        self.category(Category::Link, None)
    }

    pub fn link_as(self, key: &str) -> Self {
        self.category(Category::Link, Some(key))
    }

    pub fn meta(self) -> Self {
        self.category(Category::Meta, None)
    }

    pub fn meta_as(self, key: &str) -> Self {
        self.category(Category::Meta, Some(key))
    }

    pub fn relationship(self) -> Self {
        self.category(Category::Relationship, None)
    }

    pub fn relationship_as(self, key: &str) -> Self {
        self.category(Category::Relationship, Some(key))
    }

    /// Mark as a to-one relationship; the member's value is the related id.
    pub fn to_one(self, resource_type: &str) -> Self {
        self.mark(Marker::new(Category::ToOneIdRelationship).resource_type(resource_type))
    }

    /// Like [`to_one`](Self::to_one), rendered under `property`.
    pub fn to_one_as(self, resource_type: &str, property: &str) -> Self {
        self.mark(
            Marker::new(Category::ToOneIdRelationship)
                .resource_type(resource_type)
                .key(property),
        )
    }

    /// Mark as a relationship container; the member's value must be an object.
    pub fn relationships(self, resource_type: &str) -> Self {
        self.mark(Marker::new(Category::RelationshipContainer).resource_type(resource_type))
    }

    pub fn relationships_as(self, resource_type: &str, key: &str) -> Self {
        self.mark(
            Marker::new(Category::RelationshipContainer)
                .resource_type(resource_type)
                .key(key),
        )
    }

    pub fn fallback(self) -> Self {
        self.category(Category::GenericFallback, None)
    }

    pub fn fallback_as(self, key: &str) -> Self {
        self.category(Category::GenericFallback, Some(key))
    }

    pub fn ignore(self) -> Self {
        self.category(Category::Ignore, None)
    }

    /// Attach the generic serialization marker.
    pub fn serialized(self) -> Self {
        self.decl.serialized = Some(None);
        self
    }

    /// Attach the generic serialization marker with a name, which is used
    /// as the key when no category marker supplies one.
    pub fn serialized_as(self, name: &str) -> Self {
        self.decl.serialized = Some(Some(name.to_string()));
        self
    }

    /// Flag the member as boolean so `is_<name>` getters apply.
    pub fn boolean(self) -> Self {
        self.decl.boolean = true;
        self
    }
}
