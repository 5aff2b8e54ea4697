//! Category extraction - what one instance contributes to one document role.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::describe::Resource;
use crate::error::ExtractError;
use crate::linkage::{Linkage, MemberValue};
use crate::registry::{MemberDescriptor, Registry, TypeDescriptor};
use crate::types::{json_type_name, Category, Marker};

/// Key to value mapping contributed by one instance to one category.
pub type Contribution = BTreeMap<String, MemberValue>;

/// How a member is treated for a requested category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition<'a> {
    /// Marked with the requested category.
    Explicit(&'a Marker),
    /// Marked with another category, which claims it.
    Reserved,
    /// Marked ignore.
    Ignored,
    /// Carries only the generic serialization marker and the type opted in
    /// to catch-all extraction.
    Implicit,
    /// Nothing ties the member to the requested category.
    Unannotated,
}

impl Disposition<'_> {
    pub fn is_included(&self) -> bool {
        matches!(self, Disposition::Explicit(_) | Disposition::Implicit)
    }
}

/// Decide how `member` is treated when `requested` is extracted.
///
/// Checked in order: the requested marker, any other category marker,
/// ignore, then the generic serialization marker (catch-all only).
pub fn disposition<T>(
    member: &MemberDescriptor<T>,
    requested: Category,
    catch_all: bool,
) -> Disposition<'_> {
    if let Some(marker) = member.marker_for(requested) {
        return Disposition::Explicit(marker);
    }
    if member
        .markers()
        .iter()
        .any(|m| m.category != Category::Ignore)
    {
        return Disposition::Reserved;
    }
    if member.has_marker(Category::Ignore) {
        return Disposition::Ignored;
    }
    if requested == Category::GenericFallback && catch_all && member.is_serialized() {
        return Disposition::Implicit;
    }
    Disposition::Unannotated
}

/// Key a member is emitted under.
///
/// The category marker's key wins over the generic serialization marker's
/// name, which wins over the member name.
pub fn resolve_key<T>(member: &MemberDescriptor<T>, marker: Option<&Marker>) -> String {
    marker
        .and_then(Marker::explicit_key)
        .or_else(|| member.serialized_name())
        .unwrap_or_else(|| member.name())
        .to_string()
}

/// Extract `category` from `object`.
///
/// Fields are processed before methods; when both resolve to the same key
/// the method's value is kept. Any failure aborts the whole extraction.
///
/// # Errors
///
/// - `ExtractError::Configuration` if an included member cannot be read or
///   a relationship marker lacks a type discriminator.
/// - `ExtractError::TypeMismatch` if a relationship container does not
///   produce an object.
/// - `ExtractError::Access` if reading an included member fails.
pub fn extract<T: Resource>(
    registry: &Registry,
    object: &T,
    category: Category,
) -> Result<Contribution, ExtractError> {
    let descriptor = registry.descriptor::<T>()?;
    extract_with(&descriptor, object, category)
}

/// Extract `category` from `object` using an already resolved descriptor.
pub fn extract_with<T>(
    descriptor: &TypeDescriptor<T>,
    object: &T,
    category: Category,
) -> Result<Contribution, ExtractError> {
    let type_name = descriptor.type_name();
    let mut contribution = Contribution::new();

    for member in descriptor.fields().iter().chain(descriptor.methods()) {
        let disposition = disposition(member, category, descriptor.catch_all());
        trace!(
            type_name,
            member = member.name(),
            %category,
            ?disposition,
            "member disposition"
        );

        let marker = match disposition {
            Disposition::Explicit(marker) => Some(marker),
            Disposition::Implicit => None,
            _ => continue,
        };

        let key = resolve_key(member, marker);
        let raw = member.read(object, type_name)?;
        let value = match marker {
            Some(marker) => transform(member, marker, raw, type_name)?,
            None => MemberValue::Json(raw),
        };
        contribution.insert(key, value);
    }

    Ok(contribution)
}

fn transform<T>(
    member: &MemberDescriptor<T>,
    marker: &Marker,
    raw: Value,
    type_name: &'static str,
) -> Result<MemberValue, ExtractError> {
    match marker.category {
        Category::ToOneIdRelationship => {
            let resource_type = marker.resource_type.as_deref().ok_or_else(|| {
                ExtractError::Configuration {
                    type_name,
                    member: member.name().to_string(),
                    message: "to-one relationship marker declares no type".to_string(),
                }
            })?;
            Ok(MemberValue::Linkage(Linkage::new(raw, resource_type)))
        }
        Category::RelationshipContainer => {
            if raw.is_object() {
                Ok(MemberValue::Json(raw))
            } else {
                Err(ExtractError::TypeMismatch {
                    type_name,
                    member: member.name().to_string(),
                    category: marker.category,
                    actual: json_type_name(&raw),
                })
            }
        }
        _ => Ok(MemberValue::Json(raw)),
    }
}
