use alchemy_schema::{CollectionDraft, FieldDefinition, FieldPatch, FieldType};
use serde::Serialize;

use crate::editor::EditorStatus;
use crate::event::EditorEvent;

/// The controlled inputs of one field row, bound to the field at `index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRow {
    pub index: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub array: bool,
    /// Empty when the field has no default, as a text input shows it.
    pub default: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// A change made through one of a row's controls.
#[derive(Debug, Clone, PartialEq)]
pub enum RowControl {
    Name(String),
    Type(FieldType),
    Default(String),
    Array(bool),
    Required(bool),
    Values(Vec<String>),
}

impl FieldRow {
    fn project(index: usize, field: &FieldDefinition) -> Self {
        Self {
            index,
            name: field.name.clone(),
            field_type: field.field_type,
            required: field.required,
            array: field.array,
            default: field.default.clone().unwrap_or_default(),
            values: field.values.clone(),
        }
    }

    /// The event a control change on this row produces: an update of this
    /// row carrying only the changed attribute. Clearing the default input
    /// clears the default.
    pub fn on_change(&self, control: RowControl) -> EditorEvent {
        let patch = match control {
            RowControl::Name(name) => FieldPatch::default().name(name),
            RowControl::Type(field_type) => FieldPatch::default().field_type(field_type),
            RowControl::Default(value) if value.is_empty() => {
                FieldPatch::default().default_value(None)
            }
            RowControl::Default(value) => FieldPatch::default().default_value(Some(value)),
            RowControl::Array(array) => FieldPatch::default().array(array),
            RowControl::Required(required) => FieldPatch::default().required(required),
            RowControl::Values(values) => FieldPatch::default().values(values),
        };
        EditorEvent::UpdateField {
            index: self.index,
            patch,
        }
    }

    pub fn on_remove(&self) -> EditorEvent {
        EditorEvent::RemoveField { index: self.index }
    }
}

pub fn field_rows(draft: &CollectionDraft) -> Vec<FieldRow> {
    draft
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| FieldRow::project(index, field))
        .collect()
}

pub fn heading(name: &str) -> String {
    if name.is_empty() {
        "Properties".to_string()
    } else {
        format!("Properties of a {name}")
    }
}

/// Everything the editor page renders, derived from one draft snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub name: String,
    pub heading: String,
    pub rows: Vec<FieldRow>,
    pub type_options: Vec<&'static str>,
    pub status: EditorStatus,
    pub revision: u64,
}

impl EditorView {
    pub fn project(draft: &CollectionDraft, status: &EditorStatus, revision: u64) -> Self {
        Self {
            name: draft.name.clone(),
            heading: heading(&draft.name),
            rows: field_rows(draft),
            type_options: FieldType::ALL.iter().map(|t| t.label()).collect(),
            status: status.clone(),
            revision,
        }
    }
}
