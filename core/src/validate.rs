//! Validation of collected command values against the schema tree.
//!
//! After resolution the bound field values are reassembled into a nested
//! record mirroring the schema's nesting; this module walks that record
//! against the declared types and reports every offending field rather
//! than stopping at the first.

use thiserror::Error;

use crate::types::{SchemaNode, ValueMap, ValueType};
use serde_json::Value;

/// A single field validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Value does not match the field's declared type.
    #[error("'{field}' expected {expected}, got {value}")]
    WrongType {
        /// Canonical field name.
        field: String,
        /// Declared type rendering.
        expected: String,
        /// Offending value rendering.
        value: String,
    },
    /// Value is not one of the enumeration's variants.
    #[error("'{field}' value {value} is not one of: {options}")]
    InvalidEnumMember {
        /// Canonical field name.
        field: String,
        /// Offending value rendering.
        value: String,
        /// Comma-joined variant spellings.
        options: String,
    },
    /// JSON-literal field holds text that does not parse as JSON.
    #[error("'{field}' is not valid JSON: {reason}")]
    InvalidJson {
        /// Canonical field name.
        field: String,
        /// Parser message.
        reason: String,
    },
    /// A required field of the executing node was never bound.
    #[error("'{field}' is a required field")]
    MissingRequired {
        /// Canonical field name.
        field: String,
    },
    /// Record key does not name a child of the node.
    #[error("'{field}' not part of '{node}' fields")]
    UnknownField {
        /// The unknown key.
        field: String,
        /// Node the lookup ran against.
        node: String,
    },
}

/// Validates a nested record against a schema node.
///
/// Namespace keys recurse; field keys are checked against their declared
/// [`ValueType`]. Required fields are deliberately not enforced here —
/// they apply only to the node actually executing (see
/// [`check_required`]).
///
/// # Examples
///
/// ```
/// use schema_shell_core::{FieldSchema, SchemaNode, validate_record};
/// use serde_json::json;
///
/// let tree = SchemaNode::namespace("root")
///     .with_child(SchemaNode::field("count", FieldSchema::int()));
///
/// let good = json!({"count": 3});
/// assert!(validate_record(&tree, good.as_object().unwrap()).is_empty());
///
/// let bad = json!({"count": "three"});
/// assert_eq!(validate_record(&tree, bad.as_object().unwrap()).len(), 1);
/// ```
pub fn validate_record(node: &SchemaNode, record: &ValueMap) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_level(node, record, &mut errors);
    errors
}

/// Checks that every required field of `node` appears in `provided`.
pub fn check_required(node: &SchemaNode, provided: &ValueMap) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if let Some(ns) = node.as_namespace() {
        for child in &ns.children {
            if let Some(field) = child.as_field() {
                if field.required && !provided.contains_key(&child.name) {
                    errors.push(ValidationError::MissingRequired {
                        field: child.name.clone(),
                    });
                }
            }
        }
    }
    errors
}

fn validate_level(node: &SchemaNode, record: &ValueMap, errors: &mut Vec<ValidationError>) {
    for (key, value) in record {
        match node.child(key) {
            Some(child) => match child.as_field() {
                Some(field) => check_value(&child.name, &field.value_type, value, errors),
                None => {
                    if let Some(inner) = value.as_object() {
                        validate_level(child, inner, errors);
                    }
                }
            },
            None => errors.push(ValidationError::UnknownField {
                field: key.clone(),
                node: node.name.clone(),
            }),
        }
    }
}

fn type_matches(value_type: &ValueType, value: &Value) -> bool {
    match value_type {
        ValueType::Any | ValueType::Callable => true,
        ValueType::Str => value.is_string(),
        ValueType::Bool => value.is_boolean(),
        ValueType::Int => value.is_i64() || value.is_u64(),
        ValueType::Float => value.is_number(),
        ValueType::Json => value
            .as_str()
            .is_some_and(|s| serde_json::from_str::<Value>(s).is_ok()),
        ValueType::Enum(variants) => value
            .as_str()
            .is_some_and(|s| variants.iter().any(|v| v == s)),
        ValueType::Union(types) => types.iter().any(|t| type_matches(t, value)),
        ValueType::List(inner) => match value {
            Value::Array(items) => items.iter().all(|v| type_matches(inner, v)),
            single => type_matches(inner, single),
        },
    }
}

fn check_value(name: &str, value_type: &ValueType, value: &Value, errors: &mut Vec<ValidationError>) {
    if type_matches(value_type, value) {
        return;
    }
    let rendered = value.to_string();
    errors.push(match value_type {
        ValueType::Enum(variants) => ValidationError::InvalidEnumMember {
            field: name.to_string(),
            value: rendered,
            options: variants.join(", "),
        },
        ValueType::Json => ValidationError::InvalidJson {
            field: name.to_string(),
            reason: value
                .as_str()
                .map(|s| match serde_json::from_str::<Value>(s) {
                    Ok(_) => String::new(),
                    Err(e) => e.to_string(),
                })
                .unwrap_or_else(|| "value is not a string".to_string()),
        },
        other => ValidationError::WrongType {
            field: name.to_string(),
            expected: other.to_string(),
            value: rendered,
        },
    });
}
