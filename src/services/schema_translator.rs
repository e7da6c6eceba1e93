//! Parameter schema translation
//!
//! Turns a capability's loosely typed field map into a [`Validator`] that
//! checks inbound parameter records field by field, and renders the JSON
//! Schema advertised to protocol clients.
//!
//! # Type Mapping
//!
//! | Declared type | Rule                          | JSON Schema          |
//! |---------------|-------------------------------|----------------------|
//! | string        | value is a string             | `"string"`           |
//! | number        | value is a number             | `"number"`           |
//! | boolean       | value is a boolean            | `"boolean"`          |
//! | array         | value is an array, any items  | `"array"`            |
//! | object        | value is an object, any keys  | `"object"`           |
//! | anything else | unrestricted, may be absent   | no `type` constraint |
//!
//! Unknown or missing declared types never fail translation; they translate
//! to the unrestricted rule. The schema is open: fields the map does not
//! declare are passed through untouched.

use crate::config::document::{DeclaredType, SchemaField};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Validation rule for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl FieldRule {
    /// The one translation point from declared type to rule
    pub fn from_declared(declared: DeclaredType) -> Self {
        match declared {
            DeclaredType::String => FieldRule::String,
            DeclaredType::Number => FieldRule::Number,
            DeclaredType::Boolean => FieldRule::Boolean,
            DeclaredType::Array => FieldRule::Array,
            DeclaredType::Object => FieldRule::Object,
            DeclaredType::Unknown => FieldRule::Any,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldRule::String => value.is_string(),
            FieldRule::Number => value.is_number(),
            FieldRule::Boolean => value.is_boolean(),
            FieldRule::Array => value.is_array(),
            FieldRule::Object => value.is_object(),
            FieldRule::Any => true,
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, FieldRule::Any)
    }

    fn type_name(&self) -> Option<&'static str> {
        match self {
            FieldRule::String => Some("string"),
            FieldRule::Number => Some("number"),
            FieldRule::Boolean => Some("boolean"),
            FieldRule::Array => Some("array"),
            FieldRule::Object => Some("object"),
            FieldRule::Any => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidator {
    pub name: String,
    pub rule: FieldRule,
    pub description: String,
}

/// A single failing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    Missing { field: String, expected: &'static str },
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing { field, expected } => {
                write!(f, "'{}' is required ({})", field, expected)
            }
            FieldIssue::WrongType {
                field,
                expected,
                found,
            } => write!(f, "'{}' expected {}, got {}", field, expected, found),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid parameters: {}", format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Composite parameter validator for one capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    fields: Vec<FieldValidator>,
}

impl Validator {
    pub fn fields(&self) -> &[FieldValidator] {
        &self.fields
    }

    /// Checks `params` against every declared field
    ///
    /// Every failing field is reported, not only the first. On success the
    /// record is returned unchanged, including undeclared fields.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - One or more declared fields are missing or mistyped
    pub fn validate(&self, params: Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut issues = Vec::new();

        for field in &self.fields {
            let Some(expected) = field.rule.type_name() else {
                continue;
            };

            match params.get(&field.name) {
                None => issues.push(FieldIssue::Missing {
                    field: field.name.clone(),
                    expected,
                }),
                Some(value) if !field.rule.accepts(value) => issues.push(FieldIssue::WrongType {
                    field: field.name.clone(),
                    expected,
                    found: json_type_name(value),
                }),
                Some(_) => {}
            }
        }

        if issues.is_empty() {
            Ok(params)
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Validates an arbitrary JSON value, which must be an object
    pub fn validate_value(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Object(map) => self.validate(map.clone()).map(|_| ()),
            other if self.fields.is_empty() => {
                tracing::trace!(found = json_type_name(other), "Non-object value with empty schema");
                Ok(())
            }
            other => Err(ValidationError {
                issues: vec![FieldIssue::WrongType {
                    field: "$".to_string(),
                    expected: "object",
                    found: json_type_name(other),
                }],
            }),
        }
    }

    /// Renders the JSON Schema object advertised for this validator
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dynamcp::config::document::{DeclaredType, SchemaField};
    /// use dynamcp::services::schema_translator::translate;
    ///
    /// let validator = translate(&[SchemaField {
    ///     field_name: "a".to_string(),
    ///     declared_type: DeclaredType::Number,
    ///     description: "First operand".to_string(),
    /// }]);
    /// let schema = validator.to_json_schema();
    /// assert_eq!(schema["properties"]["a"]["type"], "number");
    /// assert_eq!(schema["required"][0], "a");
    /// ```
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut property = Map::new();
            if let Some(type_name) = field.rule.type_name() {
                property.insert("type".to_string(), json!(type_name));
            }
            if !field.description.is_empty() {
                property.insert("description".to_string(), json!(field.description));
            }
            properties.insert(field.name.clone(), Value::Object(property));

            if field.rule.is_required() {
                required.push(field.name.clone());
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Renders prompt arguments in `prompts/list` form
    pub fn to_prompt_arguments(&self) -> Vec<Value> {
        self.fields
            .iter()
            .map(|field| {
                json!({
                    "name": field.name,
                    "description": field.description,
                    "required": field.rule.is_required(),
                })
            })
            .collect()
    }
}

/// Translates a field map into a [`Validator`]
///
/// Never fails: unknown types become unrestricted rules.
pub fn translate(fields: &[SchemaField]) -> Validator {
    Validator {
        fields: fields
            .iter()
            .map(|field| FieldValidator {
                name: field.field_name.clone(),
                rule: FieldRule::from_declared(field.declared_type),
                description: field.description.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, declared_type: DeclaredType) -> SchemaField {
        SchemaField {
            field_name: name.to_string(),
            declared_type,
            description: String::new(),
        }
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_rule_per_declared_type() {
        assert_eq!(FieldRule::from_declared(DeclaredType::String), FieldRule::String);
        assert_eq!(FieldRule::from_declared(DeclaredType::Number), FieldRule::Number);
        assert_eq!(FieldRule::from_declared(DeclaredType::Boolean), FieldRule::Boolean);
        assert_eq!(FieldRule::from_declared(DeclaredType::Array), FieldRule::Array);
        assert_eq!(FieldRule::from_declared(DeclaredType::Object), FieldRule::Object);
        assert_eq!(FieldRule::from_declared(DeclaredType::Unknown), FieldRule::Any);
    }

    #[test]
    fn test_null_rejected_for_typed_fields() {
        let validator = translate(&[field("name", DeclaredType::String)]);
        let err = validator.validate(params(json!({"name": null}))).unwrap_err();

        assert_eq!(
            err.issues,
            vec![FieldIssue::WrongType {
                field: "name".to_string(),
                expected: "string",
                found: "null",
            }]
        );
    }

    #[test]
    fn test_all_issues_reported() {
        let validator = translate(&[
            field("a", DeclaredType::Number),
            field("b", DeclaredType::Number),
        ]);
        let err = validator.validate(params(json!({"a": "two"}))).unwrap_err();

        assert_eq!(err.issues.len(), 2);
        assert!(err.to_string().contains("'a' expected number, got string"));
        assert!(err.to_string().contains("'b' is required"));
    }

    #[test]
    fn test_unknown_field_may_be_absent() {
        let validator = translate(&[field("anything", DeclaredType::Unknown)]);
        assert!(validator.validate(Map::new()).is_ok());

        let schema = validator.to_json_schema();
        assert!(schema["properties"]["anything"].get("type").is_none());
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn test_output_value_must_be_object_when_schema_declared() {
        let validator = translate(&[field("result", DeclaredType::Number)]);
        assert!(validator.validate_value(&json!({"result": 5})).is_ok());
        assert!(validator.validate_value(&json!(5)).is_err());

        assert!(Validator::default().validate_value(&json!("text")).is_ok());
    }
}
