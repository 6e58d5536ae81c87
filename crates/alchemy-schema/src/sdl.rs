//! Preview of the GraphQL type the backend generates for a collection.

use std::fmt::Write;

use heck::{ToPascalCase, ToShoutySnakeCase};

use crate::draft::CollectionDraft;
use crate::field::{FieldDefinition, FieldType};

const FALLBACK_TYPE_NAME: &str = "Collection";

/// Render the draft as GraphQL SDL. Enum fields get their own
/// `enum <Type><Field>Enum` block ahead of the object type. Fields without a
/// name are skipped so a half-filled draft still renders.
pub fn render_sdl(draft: &CollectionDraft) -> String {
    let type_name = type_name(&draft.name);
    let mut enums = String::new();
    let mut body = String::new();

    for field in draft.fields.iter().filter(|f| !f.name.is_empty()) {
        let scalar = match field.field_type {
            FieldType::Enum => {
                let enum_name = format!("{type_name}{}Enum", field.name.to_pascal_case());
                write_enum(&mut enums, &enum_name, field);
                enum_name
            }
            other => scalar_name(other).to_string(),
        };
        let _ = writeln!(body, "  {}: {}", field.name, field_type(field, scalar));
    }

    let mut sdl = enums;
    let _ = write!(sdl, "type {type_name} {{\n{body}}}\n");
    sdl
}

/// The GraphQL type name of a collection.
pub fn type_name(collection: &str) -> String {
    let name = collection.to_pascal_case();
    if name.is_empty() {
        FALLBACK_TYPE_NAME.to_string()
    } else {
        name
    }
}

/// The GraphQL enum value an Enum field value is exposed as.
pub fn enum_symbol(value: &str) -> String {
    value.to_shouty_snake_case()
}

fn scalar_name(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Integer => "Int",
        FieldType::Float => "Float",
        FieldType::Boolean => "Boolean",
        _ => "String",
    }
}

fn field_type(field: &FieldDefinition, scalar: String) -> String {
    let ty = if field.array {
        format!("[{scalar}]")
    } else {
        scalar
    };
    if field.required { format!("{ty}!") } else { ty }
}

fn write_enum(out: &mut String, name: &str, field: &FieldDefinition) {
    let _ = writeln!(out, "enum {name} {{");
    for value in field.enum_values() {
        let _ = writeln!(out, "  {}", enum_symbol(value));
    }
    let _ = writeln!(out, "}}");
}
