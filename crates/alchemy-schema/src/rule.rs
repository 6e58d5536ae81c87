//! Conversion of a draft into the schema document the backend attaches to a
//! collection: a JSON-schema rule plus the message and enforcement level
//! used when a document is rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::draft::CollectionDraft;
use crate::field::{FieldDefinition, FieldType};
use crate::validate::{ValidationError, validate_draft};

const LOCAL_DATE_TIME_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?$";

/// How strictly the backend enforces the rule on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaLevel {
    /// Rule is stored but never checked.
    None,
    /// Only inserts are checked.
    New,
    /// Updates to already-valid documents are checked.
    Moderate,
    #[default]
    Strict,
}

impl SchemaLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaLevel::None => "none",
            SchemaLevel::New => "new",
            SchemaLevel::Moderate => "moderate",
            SchemaLevel::Strict => "strict",
        }
    }
}

impl fmt::Display for SchemaLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SchemaLevel::None),
            "new" => Ok(SchemaLevel::New),
            "moderate" => Ok(SchemaLevel::Moderate),
            "strict" => Ok(SchemaLevel::Strict),
            other => Err(format!("unknown schema level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub message: String,
    pub level: SchemaLevel,
    pub rule: Rule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    pub additional_properties: bool,
}

/// Validate `draft` and build its schema document.
pub fn build_schema(
    draft: &CollectionDraft,
    level: SchemaLevel,
) -> Result<CollectionSchema, Vec<ValidationError>> {
    validate_draft(draft)?;

    let required: Vec<String> = draft.required_fields().map(str::to_string).collect();
    let properties = draft
        .fields
        .iter()
        .map(|field| (field.name.clone(), field_property(field)))
        .collect();

    Ok(CollectionSchema {
        message: format!("document does not match the '{}' collection schema", draft.name),
        level,
        rule: Rule {
            rule_type: "object".into(),
            properties,
            required: (!required.is_empty()).then_some(required),
            additional_properties: false,
        },
    })
}

/// The JSON-schema fragment for one field. A default that cannot be read as
/// the field's type is left out.
pub fn field_property(field: &FieldDefinition) -> Value {
    let mut property = if field.array {
        let mut array = json!({
            "type": "array",
            "items": scalar_property(field, false),
        });
        if let Some(min) = field.min_length {
            array["minItems"] = json!(min);
        }
        if let Some(max) = field.max_length {
            array["maxItems"] = json!(max);
        }
        array
    } else {
        scalar_property(field, true)
    };

    if let Ok(Some(default)) = default_value(field) {
        property["default"] = default;
    }
    property
}

fn scalar_property(field: &FieldDefinition, with_lengths: bool) -> Value {
    let mut property = match field.field_type {
        FieldType::Text => json!({ "type": "string" }),
        FieldType::Uuid => string_format("uuid"),
        FieldType::Email => string_format("email"),
        FieldType::Ipv4 => string_format("ipv4"),
        FieldType::Ipv6 => string_format("ipv6"),
        FieldType::Ip => json!({
            "type": "string",
            "anyOf": [{ "format": "ipv4" }, { "format": "ipv6" }],
        }),
        FieldType::Integer => json!({ "type": "integer" }),
        FieldType::Float => json!({ "type": "number" }),
        FieldType::Boolean => json!({ "type": "boolean" }),
        FieldType::File => string_format("uri-reference"),
        FieldType::Date => string_format("date"),
        FieldType::Time => string_format("time"),
        FieldType::DateTime => json!({ "type": "string", "pattern": LOCAL_DATE_TIME_PATTERN }),
        FieldType::DateTimeTz => string_format("date-time"),
        FieldType::Coordinate => coordinate(),
        FieldType::LineString => json!({
            "type": "array",
            "items": coordinate(),
            "minItems": 2,
        }),
        FieldType::Polygon => json!({
            "type": "array",
            "items": {
                "type": "array",
                "items": coordinate(),
                "minItems": 4,
            },
        }),
        FieldType::Enum => json!({
            "enum": field.enum_values().collect::<Vec<_>>(),
        }),
        FieldType::Object => json!({ "type": "object" }),
    };

    if with_lengths && field.field_type.is_textual() {
        if let Some(min) = field.min_length {
            property["minLength"] = json!(min);
        }
        if let Some(max) = field.max_length {
            property["maxLength"] = json!(max);
        }
    }
    property
}

fn string_format(format: &str) -> Value {
    json!({ "type": "string", "format": format })
}

fn coordinate() -> Value {
    json!({
        "type": "array",
        "items": { "type": "number" },
        "minItems": 2,
        "maxItems": 2,
    })
}

/// The field's default read as its JSON type. `Err` names what the raw text
/// should have been.
pub(crate) fn default_value(field: &FieldDefinition) -> Result<Option<Value>, &'static str> {
    let Some(raw) = field.default.as_deref() else {
        return Ok(None);
    };

    if field.array {
        let items = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            _ => return Err("JSON array"),
        };
        if !items.iter().all(|item| item_matches(field, item)) {
            return Err("JSON array of matching items");
        }
        return Ok(Some(Value::Array(items)));
    }

    let value = match field.field_type {
        FieldType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "integer")?,
        FieldType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or("number")?,
        FieldType::Boolean => raw
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| "boolean")?,
        FieldType::Enum => {
            if !field.enum_values().any(|v| v == raw) {
                return Err("enum value");
            }
            Value::String(raw.to_string())
        }
        FieldType::Object => match serde_json::from_str::<Value>(raw) {
            Ok(object @ Value::Object(_)) => object,
            _ => return Err("JSON object"),
        },
        ty if ty.is_geometry() => match serde_json::from_str::<Value>(raw) {
            Ok(array @ Value::Array(_)) => array,
            _ => return Err("JSON coordinate array"),
        },
        _ => Value::String(raw.to_string()),
    };
    Ok(Some(value))
}

fn item_matches(field: &FieldDefinition, item: &Value) -> bool {
    match field.field_type {
        FieldType::Integer => item.is_i64() || item.is_u64(),
        FieldType::Float => item.is_number(),
        FieldType::Boolean => item.is_boolean(),
        FieldType::Enum => item
            .as_str()
            .is_some_and(|s| field.enum_values().any(|v| v == s)),
        FieldType::Object => item.is_object(),
        ty if ty.is_geometry() => item.is_array(),
        _ => item.is_string(),
    }
}
