//! Document validation against a collection schema.

use super::Document;
use crate::error::Error;
use crate::model::Level;
use crate::schema::{CollectionSchema, JsonType, PropertySchema};
use serde_json::Value;

/// Check a document against a collection schema.
///
/// System attributes (names starting with `_`) are never validated. With
/// level `none` nothing is checked. Every other level applies to inserts,
/// which are always new documents.
pub fn validate_document(
    collection: &str,
    document: &Document,
    schema: &CollectionSchema,
) -> Result<(), Error> {
    if schema.level == Level::None {
        return Ok(());
    }

    let violation = |message: String| Error::SchemaViolation {
        collection: collection.to_string(),
        message,
    };

    for name in &schema.rule.required {
        if !document.contains_key(name) {
            return Err(violation(format!("missing required attribute '{name}'")));
        }
    }

    for (name, value) in document {
        if name.starts_with('_') {
            continue;
        }
        match schema.rule.properties.get(name) {
            Some(rule) => check_value(rule, value).map_err(|m| violation(format!("'{name}' {m}")))?,
            None if !schema.rule.additional_properties => {
                return Err(violation(format!("unexpected attribute '{name}'")));
            }
            None => {}
        }
    }

    Ok(())
}

fn check_value(rule: &PropertySchema, value: &Value) -> Result<(), String> {
    match rule.json_type {
        JsonType::Number => {
            let n = value
                .as_f64()
                .ok_or_else(|| format!("must be a number, got {value}"))?;
            if let Some(step) = rule.multiple_of {
                if step > 0 && (n % step as f64) != 0.0 {
                    return Err(format!("must be a multiple of {step}"));
                }
            }
            if let Some(min) = rule.minimum {
                if n < min {
                    return Err(format!("must be >= {min}"));
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    return Err(format!("must be <= {max}"));
                }
            }
        }
        JsonType::String => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("must be a string, got {value}"))?;
            let len = s.chars().count() as u64;
            if let Some(min) = rule.min_length {
                if len < min {
                    return Err(format!("must have at least {min} characters"));
                }
            }
            if let Some(max) = rule.max_length {
                if len > max {
                    return Err(format!("must have at most {max} characters"));
                }
            }
        }
        JsonType::Array => {
            let items = value
                .as_array()
                .ok_or_else(|| format!("must be an array, got {value}"))?;
            if let Some(item_rule) = &rule.items {
                for (i, item) in items.iter().enumerate() {
                    check_value(item_rule, item).map_err(|m| format!("item {i} {m}"))?;
                }
            }
        }
    }
    Ok(())
}
