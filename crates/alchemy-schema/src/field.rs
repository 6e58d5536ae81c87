use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// The type tag of a collection field.
///
/// Tags serialize with their display label (`"IPv4/6"`, `"DateTime w/ Timezone"`),
/// which is also what the field row offers in its type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "UUID")]
    Uuid,
    #[default]
    Text,
    Email,
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
    #[serde(rename = "IPv4/6")]
    Ip,
    Integer,
    Float,
    Boolean,
    File,
    Date,
    Time,
    DateTime,
    #[serde(rename = "DateTime w/ Timezone")]
    DateTimeTz,
    LineString,
    Coordinate,
    Polygon,
    Enum,
    Object,
}

impl FieldType {
    /// Every type, in selector order.
    pub const ALL: [FieldType; 19] = [
        FieldType::Uuid,
        FieldType::Text,
        FieldType::Email,
        FieldType::Ipv4,
        FieldType::Ipv6,
        FieldType::Ip,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Boolean,
        FieldType::File,
        FieldType::Date,
        FieldType::Time,
        FieldType::DateTime,
        FieldType::DateTimeTz,
        FieldType::LineString,
        FieldType::Coordinate,
        FieldType::Polygon,
        FieldType::Enum,
        FieldType::Object,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldType::Uuid => "UUID",
            FieldType::Text => "Text",
            FieldType::Email => "Email",
            FieldType::Ipv4 => "IPv4",
            FieldType::Ipv6 => "IPv6",
            FieldType::Ip => "IPv4/6",
            FieldType::Integer => "Integer",
            FieldType::Float => "Float",
            FieldType::Boolean => "Boolean",
            FieldType::File => "File",
            FieldType::Date => "Date",
            FieldType::Time => "Time",
            FieldType::DateTime => "DateTime",
            FieldType::DateTimeTz => "DateTime w/ Timezone",
            FieldType::LineString => "LineString",
            FieldType::Coordinate => "Coordinate",
            FieldType::Polygon => "Polygon",
            FieldType::Enum => "Enum",
            FieldType::Object => "Object",
        }
    }

    /// Whether values of this type are stored as JSON strings.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FieldType::Uuid
                | FieldType::Text
                | FieldType::Email
                | FieldType::Ipv4
                | FieldType::Ipv6
                | FieldType::Ip
                | FieldType::File
                | FieldType::Date
                | FieldType::Time
                | FieldType::DateTime
                | FieldType::DateTimeTz
        )
    }

    /// Geometry types are stored as nested coordinate arrays.
    pub fn is_geometry(self) -> bool {
        matches!(
            self,
            FieldType::Coordinate | FieldType::LineString | FieldType::Polygon
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type: {0}")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

/// One typed attribute of a collection.
///
/// `Default` is the row a freshly appended field starts from: an unnamed,
/// optional, scalar `Text` field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Allowed values of an `Enum` field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    /// Maximum string length, or maximum item count for array fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// The enum values that count: blank entries left by the form are skipped.
    pub fn enum_values(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// A partial [`FieldDefinition`]: every attribute that is `Some` replaces the
/// field's value when the patch is applied, everything else is kept.
///
/// The optional attributes use a nested `Option` so a patch can clear them:
/// a missing key leaves the value alone, an explicit JSON `null` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_length: Option<Option<u32>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_length: Option<Option<u32>>,
}

// A key that is present, even as `null`, becomes `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl FieldPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn array(mut self, array: bool) -> Self {
        self.array = Some(array);
        self
    }

    pub fn default_value(mut self, value: Option<String>) -> Self {
        self.default = Some(value);
        self
    }

    pub fn values(mut self, values: Vec<String>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn min_length(mut self, min: Option<u32>) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: Option<u32>) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Shallow merge of `field` and this patch.
    pub fn apply(&self, field: &FieldDefinition) -> FieldDefinition {
        let mut merged = field.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(field_type) = self.field_type {
            merged.field_type = field_type;
        }
        if let Some(required) = self.required {
            merged.required = required;
        }
        if let Some(array) = self.array {
            merged.array = array;
        }
        if let Some(default) = &self.default {
            merged.default = default.clone();
        }
        if let Some(values) = &self.values {
            merged.values = values.clone();
        }
        if let Some(min) = self.min_length {
            merged.min_length = min;
        }
        if let Some(max) = self.max_length {
            merged.max_length = max;
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldPatch::default()
    }
}
