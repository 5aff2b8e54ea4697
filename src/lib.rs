//! JSON:API Document Assembly
//!
//! Builds JSON:API document structures (primary data, included resources,
//! links, meta) from domain types whose members are declared with a closed
//! set of document roles. Producing JSON text is left to serde.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use jsonapi_doc::{extract, Category, Data, Describe, Document, MemberValue, Registry, Resource};
//! use serde_json::json;
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
//!     }
//! }
//!
//! let registry = Arc::new(Registry::new());
//! let ann = Person { id: 1, name: "Ann".into(), manager_id: 7 };
//!
//! let attributes = extract(&registry, &ann, Category::Attribute).unwrap();
//! assert_eq!(attributes["full_name"], MemberValue::Json(json!("Ann")));
//!
//! let document = Document::new(registry, Data::one(ann)).unwrap();
//! let rendered = serde_json::to_value(&document).unwrap();
//! assert_eq!(
//!     rendered["data"]["relationships"]["manager"],
//!     json!({ "data": { "id": 7, "type": "person" } })
//! );
//! ```
//!
//! # Categories
//!
//! | Category | Value contributed |
//! |----------|-------------------|
//! | `Identity` | raw value |
//! | `Attribute`, `Link`, `Meta` | raw value |
//! | `Relationship` | raw value; also admits the two below |
//! | `ToOneIdRelationship` | `{"data": {"id", "type"}}` linkage |
//! | `RelationshipContainer` | object, passed through |
//! | `Ignore` | never contributes |
//! | `GenericFallback` | raw value of catch-all members |
//!
//! # Key Resolution
//!
//! The category marker's key, else the generic serialization marker's
//! name, else the member name.

mod describe;
mod document;
mod error;
mod extract;
mod linkage;
mod object;
mod registry;
mod render;
mod types;
#[cfg(feature = "validate")]
mod validator;

pub use describe::{Describe, MemberBuilder, MemberKind, Resource};
pub use document::{Data, Document, Element, PrimaryData};
pub use error::{AccessFailure, DocumentError, ExtractError, ValidateError, Violation};
pub use extract::{disposition, extract, extract_with, resolve_key, Contribution, Disposition};
pub use linkage::{Linkage, MemberValue};
pub use object::ResourceObject;
pub use registry::{Accessor, MemberDescriptor, Registry, TypeDescriptor};
pub use render::{render_document, render_resource};
pub use types::{
    json_type_name, Category, Marker, RenderOptions, Section, ATTRIBUTES_KEY, DATA_KEY, ID_KEY,
    INCLUDED_KEY, LINKS_KEY, META_KEY, RELATIONSHIPS_KEY, TYPE_KEY,
};

#[cfg(feature = "validate")]
pub use validator::{document_schema, validate_document};
