use alchemy_schema::{CollectionSchema, SchemaLevel, ValidationError, build_schema};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::SubmitError;
use crate::event::EditorEvent;
use crate::rows::EditorView;
use crate::store::{DraftSnapshot, DraftStore};
use crate::submit::{CollectionCreated, CreateCollection, Submitter};

/// A validation issue as the page shows it next to the row it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<usize>,
    pub message: String,
}

impl From<&ValidationError> for Issue {
    fn from(e: &ValidationError) -> Self {
        Issue {
            field: e.field_index(),
            message: e.to_string(),
        }
    }
}

/// Where the editor stands after the last event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorStatus {
    Editing,
    /// The last submit found problems in the draft.
    Invalid { issues: Vec<Issue> },
    /// The last submit reached the backend and failed there.
    Failed { message: String },
    Created { collection: CollectionCreated },
}

/// The collection-builder controller: owns the draft store, applies page
/// events to it, and runs the submit action against `S`.
pub struct CollectionEditor<S: Submitter> {
    store: DraftStore,
    status: EditorStatus,
    submitter: S,
    level: SchemaLevel,
}

impl<S: Submitter> CollectionEditor<S> {
    pub fn new(submitter: S) -> Self {
        Self {
            store: DraftStore::new(),
            status: EditorStatus::Editing,
            submitter,
            level: SchemaLevel::default(),
        }
    }

    /// Enforcement level written into submitted schemas.
    pub fn with_level(mut self, level: SchemaLevel) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> SchemaLevel {
        self.level
    }

    /// The schema the current draft would be submitted with.
    pub fn preview_schema(&self) -> Result<CollectionSchema, Vec<ValidationError>> {
        build_schema(&self.store.snapshot(), self.level)
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub fn status(&self) -> &EditorStatus {
        &self.status
    }

    pub fn draft(&self) -> DraftSnapshot {
        self.store.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftSnapshot> {
        self.store.subscribe()
    }

    pub fn view(&self) -> EditorView {
        EditorView::project(&self.store.snapshot(), &self.status, self.store.revision())
    }

    /// Apply one page event. Edits never fail; the outcome of a submit is
    /// recorded in [`status`](Self::status).
    pub fn dispatch(&mut self, event: EditorEvent) -> &EditorStatus {
        let before = self.store.revision();
        let name = event.name();

        match event {
            EditorEvent::SetName { value } => self.store.set_name(value),
            EditorEvent::AppendField => self.store.append_field(),
            EditorEvent::UpdateField { index, patch } => self.store.update_field(index, &patch),
            EditorEvent::RemoveField { index } => self.store.remove_field(index),
            EditorEvent::Reset => self.store.reset(),
            EditorEvent::Submit => {
                // Outcome lands in `status`; `submit` logs it.
                let _ = self.submit();
                return &self.status;
            }
        }

        let applied = self.store.revision() != before;
        debug!(
            event = name,
            applied,
            revision = self.store.revision(),
            "editor event"
        );
        self.status = EditorStatus::Editing;
        &self.status
    }

    /// Validate the draft, convert it and hand it to the submitter. On success
    /// the draft is discarded; on failure it is kept for correction or retry.
    pub fn submit(&mut self) -> Result<CollectionCreated, SubmitError> {
        let draft = self.store.snapshot();

        let schema = match build_schema(&draft, self.level) {
            Ok(schema) => schema,
            Err(issues) => {
                warn!(
                    collection = %draft.name,
                    issues = issues.len(),
                    "draft failed validation"
                );
                self.status = EditorStatus::Invalid {
                    issues: issues.iter().map(Issue::from).collect(),
                };
                return Err(SubmitError::Invalid(issues));
            }
        };

        let request = CreateCollection {
            name: draft.name.clone(),
            schema,
        };

        match self.submitter.submit(&request) {
            Ok(created) => {
                info!(
                    collection = %created.name,
                    fields = created.fields,
                    "collection created"
                );
                self.store.reset();
                self.status = EditorStatus::Created {
                    collection: created.clone(),
                };
                Ok(created)
            }
            Err(e) => {
                warn!(collection = %request.name, error = %e, "collection submit failed");
                self.status = EditorStatus::Failed {
                    message: e.to_string(),
                };
                Err(SubmitError::Submission(e))
            }
        }
    }
}
