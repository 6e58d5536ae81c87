use alchemy_schema::FieldPatch;
use serde::{Deserialize, Serialize};

/// An input event from the editor page.
///
/// On the wire the variant is named by an `event` tag, e.g.
/// `{"event":"update_field","index":0,"patch":{"name":"email"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    SetName { value: String },
    AppendField,
    UpdateField { index: usize, patch: FieldPatch },
    RemoveField { index: usize },
    Reset,
    Submit,
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::SetName { .. } => "set_name",
            EditorEvent::AppendField => "append_field",
            EditorEvent::UpdateField { .. } => "update_field",
            EditorEvent::RemoveField { .. } => "remove_field",
            EditorEvent::Reset => "reset",
            EditorEvent::Submit => "submit",
        }
    }
}
