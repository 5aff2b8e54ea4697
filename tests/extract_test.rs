//! Integration tests for category extraction.

use std::collections::BTreeMap;

use jsonapi_doc::{
    extract, AccessFailure, Category, Describe, ExtractError, Linkage, MemberValue, Registry,
    Resource,
};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn json_of(value: &MemberValue) -> &Value {
    value.as_json().expect("plain json value")
}

#[derive(Debug, PartialEq)]
struct Person {
    id: u64,
    name: String,
    manager_id: u64,
}

impl Resource for Person {
    const TYPE: &'static str = "person";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |p| &p.id).identity();
        d.field("name", |p| &p.name).attribute_as("full_name");
        d.field("manager_id", |p| &p.manager_id)
            .to_one_as("person", "manager");
    }
}

fn ann() -> Person {
    Person {
        id: 1,
        name: "Ann".into(),
        manager_id: 7,
    }
}

// === Person Scenarios ===

mod person {
    use super::*;

    #[test]
    fn attribute_uses_key_override() {
        init_tracing();
        let registry = Registry::new();
        let attributes = extract(&registry, &ann(), Category::Attribute).unwrap();
        let expected: BTreeMap<_, _> =
            [("full_name".to_string(), MemberValue::Json(json!("Ann")))].into();
        assert_eq!(attributes, expected);
    }

    #[test]
    fn link_category_is_empty() {
        let registry = Registry::new();
        assert!(extract(&registry, &ann(), Category::Link)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn to_one_id_appears_as_linkage_under_relationship() {
        let registry = Registry::new();
        let relationships = extract(&registry, &ann(), Category::Relationship).unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(
            relationships["manager"],
            MemberValue::Linkage(Linkage::new(7, "person"))
        );
    }

    #[test]
    fn to_one_id_category_alone() {
        let registry = Registry::new();
        let linkages = extract(&registry, &ann(), Category::ToOneIdRelationship).unwrap();
        let linkage = linkages["manager"].as_linkage().unwrap();
        assert_eq!(linkage.id(), &json!(7));
        assert_eq!(linkage.resource_type(), "person");
    }

    #[test]
    fn identity_category() {
        let registry = Registry::new();
        let identity = extract(&registry, &ann(), Category::Identity).unwrap();
        assert_eq!(json_of(&identity["id"]), &json!(1));
    }

    #[test]
    fn extraction_is_idempotent() {
        let registry = Registry::new();
        let person = ann();
        for category in Category::ALL {
            let first = extract(&registry, &person, category).unwrap();
            let second = extract(&registry, &person, category).unwrap();
            assert_eq!(first, second);
        }
    }
}

// === Key Precedence ===

#[derive(Debug, PartialEq)]
struct Article {
    id: String,
    title: String,
    subtitle: String,
    body: String,
    draft: bool,
}

impl Resource for Article {
    const TYPE: &'static str = "article";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |a| &a.id).identity();
        d.field("title", |a| &a.title)
            .attribute_as("headline")
            .serialized_as("ignored_name");
        d.field("subtitle", |a| &a.subtitle)
            .attribute()
            .serialized_as("tagline");
        d.field("body", |a| &a.body).attribute();
        d.field("draft", |a| &a.draft).meta_as("");
    }
}

fn article() -> Article {
    Article {
        id: "a1".into(),
        title: "Hello".into(),
        subtitle: "World".into(),
        body: "...".into(),
        draft: true,
    }
}

mod key_precedence {
    use super::*;

    #[test]
    fn marker_key_beats_serialized_name() {
        let registry = Registry::new();
        let attributes = extract(&registry, &article(), Category::Attribute).unwrap();
        assert!(attributes.contains_key("headline"));
        assert!(!attributes.contains_key("ignored_name"));
    }

    #[test]
    fn serialized_name_beats_member_name() {
        let registry = Registry::new();
        let attributes = extract(&registry, &article(), Category::Attribute).unwrap();
        assert_eq!(json_of(&attributes["tagline"]), &json!("World"));
        assert!(!attributes.contains_key("subtitle"));
    }

    #[test]
    fn member_name_is_last_resort() {
        let registry = Registry::new();
        let attributes = extract(&registry, &article(), Category::Attribute).unwrap();
        assert_eq!(json_of(&attributes["body"]), &json!("..."));
    }

    #[test]
    fn empty_key_counts_as_absent() {
        let registry = Registry::new();
        let meta = extract(&registry, &article(), Category::Meta).unwrap();
        assert_eq!(json_of(&meta["draft"]), &json!(true));
    }
}

// === Category Exclusivity and Catch-all ===

#[derive(Debug, PartialEq)]
struct Gadget {
    id: u32,
    name: String,
    color: String,
    serial: String,
    notes: String,
}

impl Resource for Gadget {
    const TYPE: &'static str = "gadget";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |g| &g.id).identity();
        d.field("name", |g| &g.name).attribute().serialized();
        d.field("color", |g| &g.color).serialized_as("colour");
        d.field("serial", |g| &g.serial).ignore().serialized();
        d.field("notes", |g| &g.notes);
        d.method("summary", |g| format!("{} ({})", g.name, g.color))
            .fallback_as("summary_text");
    }
}

/// Same members as `Gadget`, plus catch-all opt-in.
#[derive(Debug, PartialEq)]
struct OpenGadget(Gadget);

impl Resource for OpenGadget {
    const TYPE: &'static str = "gadget";

    fn describe(d: &mut Describe<Self>) {
        d.catch_all();
        d.inherit(|o| &o.0, |o| &mut o.0);
    }
}

fn gadget() -> Gadget {
    Gadget {
        id: 3,
        name: "lamp".into(),
        color: "red".into(),
        serial: "SN-1".into(),
        notes: "fragile".into(),
    }
}

mod exclusivity {
    use super::*;

    #[test]
    fn marked_member_only_in_its_category() {
        let registry = Registry::new();
        for category in Category::ALL {
            let contribution = extract(&registry, &gadget(), category).unwrap();
            let has_name = contribution.contains_key("name");
            assert_eq!(has_name, category == Category::Attribute, "{category}");
        }
    }

    #[test]
    fn unannotated_member_never_contributes() {
        let registry = Registry::new();
        for category in Category::ALL {
            let contribution = extract(&registry, &OpenGadget(gadget()), category).unwrap();
            assert!(!contribution.contains_key("notes"), "{category}");
        }
    }

    #[test]
    fn ignored_member_absent_from_every_category() {
        let registry = Registry::new();
        for category in Category::ALL {
            let contribution = extract(&registry, &OpenGadget(gadget()), category).unwrap();
            assert!(!contribution.contains_key("serial"), "{category}");
        }
        let ignored = extract(&registry, &gadget(), Category::Ignore).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn fallback_without_opt_in_keeps_explicit_members_only() {
        let registry = Registry::new();
        let fallback = extract(&registry, &gadget(), Category::GenericFallback).unwrap();
        assert_eq!(fallback.keys().collect::<Vec<_>>(), vec!["summary_text"]);
    }

    #[test]
    fn fallback_with_opt_in_adds_serialized_members() {
        let registry = Registry::new();
        let fallback =
            extract(&registry, &OpenGadget(gadget()), Category::GenericFallback).unwrap();

        assert_eq!(json_of(&fallback["colour"]), &json!("red"));
        assert_eq!(json_of(&fallback["summary_text"]), &json!("lamp (red)"));
        // claimed by attribute
        assert!(!fallback.contains_key("name"));
        // ignored wins over the serialization marker
        assert!(!fallback.contains_key("serial"));
        assert_eq!(fallback.len(), 2);
    }
}

// === Accessors ===

#[derive(Debug, PartialEq)]
struct Base {
    id: u32,
    secret: String,
    enabled: bool,
}

impl Resource for Base {
    const TYPE: &'static str = "base";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |b| &b.id).identity();
        d.private_field("secret").meta();
        d.private_field("enabled").boolean().attribute();
        d.getter("get_secret", |b| b.secret.len());
        d.getter("is_enabled", |b| b.enabled);
    }
}

#[derive(Debug, PartialEq)]
struct Child {
    base: Base,
    secret: String,
}

impl Resource for Child {
    const TYPE: &'static str = "child";

    fn describe(d: &mut Describe<Self>) {
        d.getter("get_secret", |c| c.secret.to_uppercase());
        d.inherit(|c| &c.base, |c| &mut c.base);
    }
}

#[derive(Debug, PartialEq)]
struct Locked {
    id: u32,
}

impl Resource for Locked {
    const TYPE: &'static str = "locked";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |l| &l.id).identity();
        d.private_field("code").link();
    }
}

#[derive(Debug, PartialEq)]
struct Gauge {
    id: u32,
    total: u32,
    count: u32,
}

impl Resource for Gauge {
    const TYPE: &'static str = "gauge";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |g| &g.id).identity();
        d.field("total", |g| &g.total).meta();
        d.try_method("average", |g| {
            if g.count == 0 {
                Err("no samples")
            } else {
                Ok(g.total / g.count)
            }
        })
        .meta();
    }
}

mod accessors {
    use super::*;

    #[test]
    fn private_field_reads_through_getter() {
        let registry = Registry::new();
        let base = Base {
            id: 1,
            secret: "abc".into(),
            enabled: true,
        };
        let meta = extract(&registry, &base, Category::Meta).unwrap();
        assert_eq!(json_of(&meta["secret"]), &json!(3));

        let attributes = extract(&registry, &base, Category::Attribute).unwrap();
        assert_eq!(json_of(&attributes["enabled"]), &json!(true));
    }

    #[test]
    fn getter_search_starts_at_concrete_type() {
        let registry = Registry::new();
        let child = Child {
            base: Base {
                id: 1,
                secret: "abc".into(),
                enabled: false,
            },
            secret: "xyz".into(),
        };
        let meta = extract(&registry, &child, Category::Meta).unwrap();
        assert_eq!(json_of(&meta["secret"]), &json!("XYZ"));

        // no `is_enabled` on the child, found on the ancestor
        let attributes = extract(&registry, &child, Category::Attribute).unwrap();
        assert_eq!(json_of(&attributes["enabled"]), &json!(false));
    }

    #[test]
    fn missing_getter_fails_only_when_included() {
        let registry = Registry::new();
        let locked = Locked { id: 5 };

        assert!(extract(&registry, &locked, Category::Attribute)
            .unwrap()
            .is_empty());

        let err = extract(&registry, &locked, Category::Link).unwrap_err();
        assert!(matches!(
            &err,
            ExtractError::Configuration { member, .. } if member == "code"
        ));
        assert!(err.type_name().ends_with("Locked"));
    }

    #[test]
    fn failing_method_aborts_whole_extraction() {
        let registry = Registry::new();
        let ok = extract(
            &registry,
            &Gauge {
                id: 1,
                total: 10,
                count: 2,
            },
            Category::Meta,
        )
        .unwrap();
        assert_eq!(json_of(&ok["average"]), &json!(5));

        let err = extract(
            &registry,
            &Gauge {
                id: 1,
                total: 10,
                count: 0,
            },
            Category::Meta,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Access {
                source: AccessFailure::Invoke(_),
                ..
            }
        ));
    }
}

// === Relationship Containers ===

#[derive(Debug, PartialEq)]
struct Team {
    id: u32,
    members: Value,
}

impl Resource for Team {
    const TYPE: &'static str = "team";

    fn describe(d: &mut Describe<Self>) {
        d.field("id", |t| &t.id).identity();
        d.field("members", |t| &t.members)
            .relationships_as("person", "people");
    }
}

mod containers {
    use super::*;

    #[test]
    fn object_passes_through_unchanged() {
        let registry = Registry::new();
        let members = json!({ "lead": { "data": { "id": 1, "type": "person" } } });
        let team = Team {
            id: 1,
            members: members.clone(),
        };
        let relationships =
            extract(&registry, &team, Category::RelationshipContainer).unwrap();
        assert_eq!(json_of(&relationships["people"]), &members);

        let via_family = extract(&registry, &team, Category::Relationship).unwrap();
        assert_eq!(via_family, relationships);
    }

    #[test]
    fn non_object_is_type_mismatch() {
        let registry = Registry::new();
        let team = Team {
            id: 1,
            members: json!([1, 2]),
        };
        let err = extract(&registry, &team, Category::Relationship).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TypeMismatch { actual: "array", .. }
        ));
    }
}
