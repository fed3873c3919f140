//! JSON Schema for record files.
//!
//! The schema pins the shape of a record (required keys, value types, the
//! fixed status and owner enums). Rules that depend on configuration, such as
//! allowed categories and recognized licenses, are checked by the validator.

use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::constants::RECORD_LEVEL_FIELD;
use crate::error::{CatalogError, Result};

/// Schema bundled with the crate
pub const BUNDLED_SCHEMA: &str = include_str!("../schemas/project.v1.json");

static BUNDLED_SCHEMA_JSON: Lazy<Value> =
    Lazy::new(|| serde_json::from_str(BUNDLED_SCHEMA).unwrap_or(Value::Null));

/// One schema violation, located by dotted field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub field: String,
    pub message: String,
}

pub struct RecordSchema {
    compiled: JSONSchema,
}

impl RecordSchema {
    /// Compile the schema shipped in `schemas/project.v1.json`
    pub fn bundled() -> Result<Self> {
        Self::compile(&BUNDLED_SCHEMA_JSON)
    }

    /// Compile a schema loaded at runtime.
    pub fn from_value(schema: Value) -> Result<Self> {
        // jsonschema 0.17 expects a schema with 'static lifetime; leak the parsed
        // schema for the lifetime of the process
        let schema_static: &'static Value = Box::leak(Box::new(schema));
        Self::compile(schema_static)
    }

    fn compile(schema: &'static Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .compile(schema)
            .map_err(|e| CatalogError::Schema(e.to_string()))?;
        Ok(Self { compiled })
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }

    /// All violations of `instance`, in the order the validator reports them
    pub fn violations(&self, instance: &Value) -> Vec<SchemaViolation> {
        let Err(errors) = self.compiled.validate(instance) else {
            return Vec::new();
        };

        errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let field = match &error.kind {
                    ValidationErrorKind::Required { property } => {
                        join_field(&path, property.as_str().unwrap_or_default())
                    }
                    ValidationErrorKind::AdditionalProperties { unexpected } => {
                        join_field(&path, &unexpected.join(","))
                    }
                    _ => pointer_to_field(&path),
                };
                SchemaViolation {
                    field,
                    message: error.to_string(),
                }
            })
            .collect()
    }
}

/// `/source/url_repository` -> `source.url_repository`; the root is record-level
pub fn pointer_to_field(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        RECORD_LEVEL_FIELD.to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

fn join_field(pointer: &str, property: &str) -> String {
    let parent = pointer.trim_start_matches('/');
    if parent.is_empty() {
        property.to_string()
    } else {
        format!("{}.{}", parent.replace('/', "."), property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "name": "Widget",
            "description": "Widgets for everyone",
            "category": "web",
            "country": "Italy",
            "status": "active",
            "source": {
                "url_repository": "https://github.com/acme/widget",
                "platform": "github",
                "license": "MIT"
            },
            "metadata": {
                "filename": "widget.json",
                "source": "form",
                "submitted_at": "2024-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn bundled_schema_accepts_a_complete_record() {
        let schema = RecordSchema::bundled().unwrap();
        assert!(schema.is_valid(&valid_record()));
        assert!(schema.violations(&valid_record()).is_empty());
    }

    #[test]
    fn missing_nested_field_is_reported_with_its_path() {
        let schema = RecordSchema::bundled().unwrap();
        let mut record = valid_record();
        record["source"].as_object_mut().unwrap().remove("url_repository");

        let violations = schema.violations(&record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "source.url_repository");
        assert!(violations[0].message.contains("required"));
    }

    #[test]
    fn wrong_types_and_unknown_status_are_violations() {
        let schema = RecordSchema::bundled().unwrap();
        let mut record = valid_record();
        record["country"] = json!(42);
        record["status"] = json!("abandoned");

        let mut fields: Vec<String> =
            schema.violations(&record).into_iter().map(|v| v.field).collect();
        fields.sort();
        assert_eq!(fields, vec!["country", "status"]);
    }

    #[test]
    fn non_object_record_is_record_level() {
        let schema = RecordSchema::bundled().unwrap();
        let violations = schema.violations(&json!(["not", "a", "record"]));
        assert_eq!(violations[0].field, RECORD_LEVEL_FIELD);
    }

    #[test]
    fn pointer_conversion() {
        assert_eq!(pointer_to_field(""), RECORD_LEVEL_FIELD);
        assert_eq!(pointer_to_field("/owner/name"), "owner.name");
    }
}
