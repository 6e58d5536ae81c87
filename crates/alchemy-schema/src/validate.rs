use std::collections::HashMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::draft::CollectionDraft;
use crate::field::{FieldDefinition, FieldType};
use crate::rule::default_value;
use crate::sdl::enum_symbol;

/// Longest collection name the backend accepts, in bytes.
pub const MAX_COLLECTION_NAME_LEN: usize = 256;

/// A user-correctable problem with a draft. Field-level issues carry the
/// index of the offending row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("collection name must not be empty")]
    EmptyCollectionName,

    #[error(
        "collection name '{name}' must start with a letter and contain only letters, digits, '_' or '-'"
    )]
    InvalidCollectionName { name: String },

    #[error("collection name must be at most {max} bytes")]
    CollectionNameTooLong { max: usize },

    #[error("at least one field is required")]
    NoFields,

    #[error("field {index}: name must not be empty")]
    EmptyFieldName { index: usize },

    #[error(
        "field {index}: name '{name}' must start with a letter or '_' and contain only letters, digits or '_'"
    )]
    InvalidFieldName { index: usize, name: String },

    #[error("field {index}: duplicate name '{name}' (already used by field {first})")]
    DuplicateFieldName {
        index: usize,
        name: String,
        first: usize,
    },

    #[error("field {index}: an enum needs at least one value")]
    EnumWithoutValues { index: usize },

    #[error("field {index}: duplicate enum value '{value}'")]
    DuplicateEnumValue { index: usize, value: String },

    #[error("field {index}: enum value '{value}' must start with a letter or '_'")]
    InvalidEnumValue { index: usize, value: String },

    #[error("field {index}: enum value '{value}' clashes with '{other}' as {symbol}")]
    EnumValueCollision {
        index: usize,
        value: String,
        other: String,
        symbol: String,
    },

    #[error("field {index}: min length {min} is greater than max length {max}")]
    LengthRange { index: usize, min: u32, max: u32 },

    #[error("field {index}: default '{value}' is not a valid {expected}")]
    InvalidDefault {
        index: usize,
        value: String,
        expected: String,
    },
}

impl ValidationError {
    /// The row the issue belongs to, if it is field-level.
    pub fn field_index(&self) -> Option<usize> {
        match self {
            ValidationError::EmptyCollectionName
            | ValidationError::InvalidCollectionName { .. }
            | ValidationError::CollectionNameTooLong { .. }
            | ValidationError::NoFields => None,
            ValidationError::EmptyFieldName { index }
            | ValidationError::InvalidFieldName { index, .. }
            | ValidationError::DuplicateFieldName { index, .. }
            | ValidationError::EnumWithoutValues { index }
            | ValidationError::DuplicateEnumValue { index, .. }
            | ValidationError::InvalidEnumValue { index, .. }
            | ValidationError::EnumValueCollision { index, .. }
            | ValidationError::LengthRange { index, .. }
            | ValidationError::InvalidDefault { index, .. } => Some(*index),
        }
    }
}

/// Check a draft before it is submitted. Every issue is reported, not just
/// the first, so each row can show its own.
pub fn validate_draft(draft: &CollectionDraft) -> Result<(), Vec<ValidationError>> {
    let mut issues = Vec::new();

    check_collection_name(&draft.name, &mut issues);

    if draft.fields.is_empty() {
        issues.push(ValidationError::NoFields);
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, field) in draft.fields.iter().enumerate() {
        if field.name.is_empty() {
            issues.push(ValidationError::EmptyFieldName { index });
        } else if !is_field_identifier(&field.name) {
            issues.push(ValidationError::InvalidFieldName {
                index,
                name: field.name.clone(),
            });
        } else if let Some(&first) = seen.get(field.name.as_str()) {
            issues.push(ValidationError::DuplicateFieldName {
                index,
                name: field.name.clone(),
                first,
            });
        } else {
            seen.insert(field.name.as_str(), index);
        }

        check_field(index, field, &mut issues);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_collection_name(name: &str, issues: &mut Vec<ValidationError>) {
    if name.is_empty() {
        issues.push(ValidationError::EmptyCollectionName);
        return;
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        issues.push(ValidationError::CollectionNameTooLong {
            max: MAX_COLLECTION_NAME_LEN,
        });
    }
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        issues.push(ValidationError::InvalidCollectionName {
            name: name.to_string(),
        });
    }
}

fn is_field_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_field(index: usize, field: &FieldDefinition, issues: &mut Vec<ValidationError>) {
    if field.field_type == FieldType::Enum {
        check_enum_values(index, field, issues);
    }

    if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
        if min > max {
            issues.push(ValidationError::LengthRange { index, min, max });
        }
    }

    if let Err(expected) = default_value(field) {
        issues.push(ValidationError::InvalidDefault {
            index,
            value: field.default.clone().unwrap_or_default(),
            expected: expected.to_string(),
        });
    }
}

fn check_enum_values(index: usize, field: &FieldDefinition, issues: &mut Vec<ValidationError>) {
    if field.enum_values().next().is_none() {
        issues.push(ValidationError::EnumWithoutValues { index });
        return;
    }

    let mut unique = HashSet::new();
    let mut symbols: HashMap<String, &str> = HashMap::new();
    for value in field.enum_values() {
        if !unique.insert(value) {
            issues.push(ValidationError::DuplicateEnumValue {
                index,
                value: value.to_string(),
            });
            continue;
        }

        let symbol = enum_symbol(value);
        if !symbol
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            issues.push(ValidationError::InvalidEnumValue {
                index,
                value: value.to_string(),
            });
        } else if let Some(&other) = symbols.get(&symbol) {
            issues.push(ValidationError::EnumValueCollision {
                index,
                value: value.to_string(),
                other: other.to_string(),
                symbol,
            });
        } else {
            symbols.insert(symbol, value);
        }
    }
}
