//! Structural validation of rendered documents.

use serde_json::{json, Value};

use crate::error::{ValidateError, Violation};

/// JSON Schema for the JSON:API top-level document shape produced by
/// [`render_document`](crate::render_document).
pub fn document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "anyOf": [
            { "required": ["data"] },
            { "required": ["meta"] },
            { "required": ["errors"] }
        ],
        "properties": {
            "data": {
                "oneOf": [
                    { "type": "null" },
                    { "$ref": "#/$defs/resource" },
                    { "type": "array", "items": { "$ref": "#/$defs/resource" } }
                ]
            },
            "included": { "type": "array", "items": { "$ref": "#/$defs/resource" } },
            "links": { "type": "object" },
            "meta": { "type": "object" }
        },
        "$defs": {
            "resource": {
                "type": "object",
                "required": ["type", "id"],
                "properties": {
                    "type": { "type": "string" },
                    "id": { "type": ["string", "number"] },
                    "attributes": { "type": "object" },
                    "relationships": {
                        "type": "object",
                        "additionalProperties": { "$ref": "#/$defs/relationship" }
                    },
                    "links": { "type": "object" },
                    "meta": { "type": "object" }
                }
            },
            "relationship": {
                "type": "object",
                "anyOf": [
                    { "required": ["data"] },
                    { "required": ["links"] },
                    { "required": ["meta"] }
                ]
            }
        }
    })
}

/// Validate a rendered document against [`document_schema`].
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every violation found.
pub fn validate_document(document: &Value) -> Result<(), ValidateError> {
    let validator =
        jsonschema::validator_for(&document_schema()).map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let errors: Vec<Violation> = validator
        .iter_errors(document)
        .map(|e| Violation {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_resource() {
        let doc = json!({
            "data": {
                "type": "person",
                "id": "1",
                "attributes": { "name": "Ann" },
                "relationships": { "manager": { "data": { "id": 7, "type": "person" } } }
            }
        });
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn accepts_meta_only() {
        assert!(validate_document(&json!({ "meta": { "total": 0 } })).is_ok());
    }

    #[test]
    fn rejects_empty_document() {
        assert!(matches!(
            validate_document(&json!({})),
            Err(ValidateError::Invalid { .. })
        ));
    }

    #[test]
    fn reports_path_of_bad_resource() {
        let doc = json!({
            "data": [{ "type": "person", "id": 1 }],
            "included": [{ "type": "person" }]
        });
        match validate_document(&doc) {
            Err(ValidateError::Invalid { errors }) => {
                assert!(errors.iter().any(|e| e.path == "/included/0"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bare_relationship_value() {
        let doc = json!({
            "data": { "type": "person", "id": 1, "relationships": { "manager": 7 } }
        });
        assert!(validate_document(&doc).is_err());
    }
}
