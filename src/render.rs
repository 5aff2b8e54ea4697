//! Rendering resources and documents into JSON:API shaped values.
//!
//! Rendering only composes category contributions; text encoding is left
//! to whatever serializer walks the resulting `serde_json::Value`.

use std::cmp::Ordering;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::document::{Document, PrimaryData};
use crate::error::ExtractError;
use crate::extract::Contribution;
use crate::object::ResourceObject;
use crate::registry::Registry;
use crate::types::{
    Category, RenderOptions, Section, DATA_KEY, ID_KEY, INCLUDED_KEY, LINKS_KEY, META_KEY,
    TYPE_KEY,
};

/// Render one resource object.
///
/// Produces `type`, `id` and whichever of `attributes`, `relationships`,
/// `links` and `meta` are non-empty (or all of them when
/// `options.omit_empty` is false). Catch-all members are merged into
/// `options.catch_all_into` without overriding explicitly marked keys.
///
/// # Errors
///
/// Returns the first `ExtractError` raised by any category.
pub fn render_resource(
    registry: &Registry,
    object: &dyn ResourceObject,
    options: &RenderOptions,
) -> Result<Value, ExtractError> {
    let mut sections = [
        (Section::Attributes, object.extract(registry, Category::Attribute)?),
        (
            Section::Relationships,
            object.extract(registry, Category::Relationship)?,
        ),
        (Section::Links, object.extract(registry, Category::Link)?),
        (Section::Meta, object.extract(registry, Category::Meta)?),
    ];

    let fallback = object.extract(registry, Category::GenericFallback)?;
    if let Some((_, target)) = sections
        .iter_mut()
        .find(|(section, _)| *section == options.catch_all_into)
    {
        for (key, value) in fallback {
            target.entry(key).or_insert(value);
        }
    }

    let mut rendered = Map::new();
    rendered.insert(
        TYPE_KEY.to_string(),
        Value::String(object.resource_type().to_string()),
    );
    rendered.insert(ID_KEY.to_string(), object.identity(registry)?);

    for (section, contribution) in sections {
        if options.omit_empty && contribution.is_empty() {
            continue;
        }
        rendered.insert(section.key().to_string(), contribution_to_value(contribution));
    }

    Ok(Value::Object(rendered))
}

/// Render a whole document into the JSON:API top-level shape.
///
/// Included resources are sorted by type, then identity, so output is
/// stable across runs. Numeric ids compare by value, everything else by
/// JSON text.
pub fn render_document(document: &Document, options: &RenderOptions) -> Result<Value, ExtractError> {
    let registry = document.registry();
    let mut rendered = Map::new();

    if let Some(data) = document.data() {
        let value = match data {
            PrimaryData::One(object) => render_resource(registry, object.as_ref(), options)?,
            PrimaryData::Many(objects) => Value::Array(
                objects
                    .iter()
                    .map(|object| render_resource(registry, object.as_ref(), options))
                    .collect::<Result<_, _>>()?,
            ),
        };
        rendered.insert(DATA_KEY.to_string(), value);
    }

    let mut included = document
        .flatten_includes()
        .iter()
        .map(|object| render_resource(registry, object.as_ref(), options))
        .collect::<Result<Vec<_>, _>>()?;
    included.sort_by(|a, b| {
        let type_of = |resource: &Value| resource[TYPE_KEY].as_str().unwrap_or_default().to_string();
        type_of(a)
            .cmp(&type_of(b))
            .then_with(|| compare_ids(&a[ID_KEY], &b[ID_KEY]))
    });
    if !(options.omit_empty && included.is_empty()) {
        rendered.insert(INCLUDED_KEY.to_string(), Value::Array(included));
    }

    if !(options.omit_empty && document.links().is_empty()) {
        let links = document
            .links()
            .iter()
            .map(|(key, href)| (key.clone(), Value::String(href.clone())))
            .collect();
        rendered.insert(LINKS_KEY.to_string(), Value::Object(links));
    }

    if !(options.omit_empty && document.meta().is_empty()) {
        let meta = document
            .meta()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        rendered.insert(META_KEY.to_string(), Value::Object(meta));
    }

    Ok(Value::Object(rendered))
}

fn contribution_to_value(contribution: Contribution) -> Value {
    Value::Object(
        contribution
            .into_iter()
            .map(|(key, value)| (key, value.into_value()))
            .collect(),
    )
}

/// Serializes with default [`RenderOptions`].
fn compare_ids(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_string().cmp(&b.to_string()),
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        render_document(self, &RenderOptions::default())
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}
