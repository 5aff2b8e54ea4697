//! Core types for JSON:API document assembly.

use serde_json::Value;

/// Top-level key holding primary data (also the linkage wrapper key).
pub const DATA_KEY: &str = "data";
/// Top-level key holding secondary resources.
pub const INCLUDED_KEY: &str = "included";
/// Key holding links, both top-level and per resource.
pub const LINKS_KEY: &str = "links";
/// Key holding meta-data, both top-level and per resource.
pub const META_KEY: &str = "meta";
/// Resource object key holding attributes.
pub const ATTRIBUTES_KEY: &str = "attributes";
/// Resource object key holding relationships.
pub const RELATIONSHIPS_KEY: &str = "relationships";
/// Resource object key holding the type discriminator.
pub const TYPE_KEY: &str = "type";
/// Resource object key holding the identity value.
pub const ID_KEY: &str = "id";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The closed set of document roles a member can be marked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Identity,
    Attribute,
    Link,
    Meta,
    Relationship,
    /// To-one relationship expressed by the related resource's identity.
    ToOneIdRelationship,
    /// Member whose value is an already-shaped map of relationships.
    RelationshipContainer,
    /// Excludes the member from every category.
    Ignore,
    /// Catch-all for members carrying only the generic serialization marker.
    GenericFallback,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 9] = [
        Category::Identity,
        Category::Attribute,
        Category::Link,
        Category::Meta,
        Category::Relationship,
        Category::ToOneIdRelationship,
        Category::RelationshipContainer,
        Category::Ignore,
        Category::GenericFallback,
    ];

    /// Whether a member marked `marker` contributes when `self` is requested.
    ///
    /// `Relationship` admits the whole relationship family and `Ignore`
    /// admits nothing. Every other category only admits itself.
    pub fn admits(self, marker: Category) -> bool {
        match self {
            Category::Ignore => false,
            Category::Relationship => matches!(
                marker,
                Category::Relationship
                    | Category::ToOneIdRelationship
                    | Category::RelationshipContainer
            ),
            _ => self == marker,
        }
    }

    /// Whether a marker of this category may carry a key override.
    pub fn accepts_key(self) -> bool {
        !matches!(self, Category::Ignore)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Identity => "identity",
            Category::Attribute => "attribute",
            Category::Link => "link",
            Category::Meta => "meta",
            Category::Relationship => "relationship",
            Category::ToOneIdRelationship => "to_one_id_relationship",
            Category::RelationshipContainer => "relationship_container",
            Category::Ignore => "ignore",
            Category::GenericFallback => "generic_fallback",
        };
        f.write_str(name)
    }
}

/// One category marker attached to a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub category: Category,
    /// Explicit key override. Empty strings count as absent.
    pub key: Option<String>,
    /// Type discriminator for `ToOneIdRelationship` and `RelationshipContainer`.
    pub resource_type: Option<String>,
}

impl Marker {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            key: None,
            resource_type: None,
        }
    }

    /// Set the key override.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the type discriminator.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// The key override, if present and non-empty.
    pub fn explicit_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Resource object section a category contribution is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    Attributes,
    Relationships,
    Links,
    #[default]
    Meta,
}

impl Section {
    /// Returns the resource object key for this section.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Attributes => ATTRIBUTES_KEY,
            Section::Relationships => RELATIONSHIPS_KEY,
            Section::Links => LINKS_KEY,
            Section::Meta => META_KEY,
        }
    }
}

/// Options for rendering resources and documents.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Drop sections and top-level members that would be empty.
    pub omit_empty: bool,
    /// Where `GenericFallback` contributions land.
    pub catch_all_into: Section,
}

impl RenderOptions {
    /// Create render options with empty sections omitted and catch-all
    /// members folded into `meta`.
    pub fn new() -> Self {
        Self {
            omit_empty: true,
            catch_all_into: Section::Meta,
        }
    }

    /// Set whether empty sections are omitted.
    pub fn omit_empty(mut self, omit_empty: bool) -> Self {
        self.omit_empty = omit_empty;
        self
    }

    /// Set the section receiving catch-all members.
    pub fn catch_all_into(mut self, section: Section) -> Self {
        self.catch_all_into = section;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}
