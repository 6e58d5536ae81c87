use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use alchemy_console::*;
use alchemy_schema::{FieldPatch, FieldType, SchemaLevel};

/// Records every request and answers with a canned result.
struct FakeSubmitter {
    requests: Mutex<Vec<CreateCollection>>,
    fail_with: Option<SubmissionError>,
}

impl FakeSubmitter {
    fn accepting() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    fn failing(error: SubmissionError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    fn requests(&self) -> Vec<CreateCollection> {
        self.requests.lock().unwrap().clone()
    }
}

impl Submitter for FakeSubmitter {
    fn submit(&self, request: &CreateCollection) -> Result<CollectionCreated, SubmissionError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(CollectionCreated {
                name: request.name.clone(),
                fields: request.schema.rule.properties.len(),
            }),
        }
    }
}

/// Fails the first call, succeeds afterwards.
struct FlakySubmitter {
    calls: AtomicUsize,
}

impl Submitter for FlakySubmitter {
    fn submit(&self, request: &CreateCollection) -> Result<CollectionCreated, SubmissionError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(SubmissionError::Transport("connection reset".into()));
        }
        Ok(CollectionCreated {
            name: request.name.clone(),
            fields: request.schema.rule.properties.len(),
        })
    }
}

fn fill_users<S: Submitter>(editor: &mut CollectionEditor<S>) {
    editor.dispatch(EditorEvent::SetName {
        value: "users".into(),
    });
    editor.dispatch(EditorEvent::AppendField);
    editor.dispatch(EditorEvent::AppendField);
    editor.dispatch(EditorEvent::UpdateField {
        index: 0,
        patch: FieldPatch::default()
            .name("email")
            .field_type(FieldType::Email)
            .required(true),
    });
    editor.dispatch(EditorEvent::UpdateField {
        index: 1,
        patch: FieldPatch::default().name("nickname"),
    });
}

// ── Editing ─────────────────────────────────────────────────────

#[test]
fn events_drive_the_draft() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    fill_users(&mut editor);

    let draft = editor.draft();
    assert_eq!(draft.name, "users");
    assert_eq!(draft.fields.len(), 2);
    assert_eq!(draft.fields[0].name, "email");
    assert_eq!(draft.fields[0].field_type, FieldType::Email);
    assert!(draft.fields[0].required);
    assert_eq!(editor.revision(), 5);

    editor.dispatch(EditorEvent::RemoveField { index: 0 });
    assert_eq!(editor.draft().fields[0].name, "nickname");
    assert_eq!(*editor.status(), EditorStatus::Editing);
}

#[test]
fn out_of_range_events_are_harmless() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    editor.dispatch(EditorEvent::AppendField);
    let before = editor.draft();

    editor.dispatch(EditorEvent::RemoveField { index: 4 });
    editor.dispatch(EditorEvent::UpdateField {
        index: 9,
        patch: FieldPatch::default().name("ghost"),
    });

    assert_eq!(*editor.draft(), *before);
    assert_eq!(*editor.status(), EditorStatus::Editing);
}

#[test]
fn view_projects_rows_and_heading() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    assert_eq!(editor.view().heading, "Properties");

    fill_users(&mut editor);
    let view = editor.view();

    assert_eq!(view.heading, "Properties of a users");
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].index, 0);
    assert_eq!(view.rows[0].name, "email");
    assert_eq!(view.rows[1].default, "");
    assert_eq!(view.type_options.len(), 19);
    assert_eq!(view.type_options[0], "UUID");
    assert_eq!(view.revision, editor.revision());
}

#[test]
fn row_controls_become_single_attribute_updates() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    fill_users(&mut editor);
    let row = editor.view().rows[1].clone();

    let event = row.on_change(RowControl::Required(true));
    assert_eq!(
        event,
        EditorEvent::UpdateField {
            index: 1,
            patch: FieldPatch::default().required(true),
        }
    );
    editor.dispatch(event);
    editor.dispatch(row.on_change(RowControl::Default("anon".into())));
    assert!(editor.draft().fields[1].required);
    assert_eq!(editor.draft().fields[1].default.as_deref(), Some("anon"));

    editor.dispatch(row.on_change(RowControl::Default(String::new())));
    assert_eq!(editor.draft().fields[1].default, None);

    editor.dispatch(row.on_remove());
    assert_eq!(editor.draft().fields.len(), 1);
}

// ── Submit ──────────────────────────────────────────────────────

#[test]
fn successful_submit_hands_over_the_schema_and_resets() {
    let mut editor =
        CollectionEditor::new(FakeSubmitter::accepting()).with_level(SchemaLevel::Moderate);
    fill_users(&mut editor);

    let created = editor.submit().unwrap();
    assert_eq!(
        created,
        CollectionCreated {
            name: "users".into(),
            fields: 2,
        }
    );

    let requests = editor.submitter().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].name, "users");
    assert_eq!(requests[0].schema.level, SchemaLevel::Moderate);
    assert_eq!(requests[0].schema.rule.required, Some(vec!["email".to_string()]));

    assert!(editor.draft().fields.is_empty());
    assert_eq!(editor.draft().name, "");
    assert_eq!(
        *editor.status(),
        EditorStatus::Created {
            collection: created
        }
    );
}

#[test]
fn preview_and_submit_share_the_level() {
    let mut editor =
        CollectionEditor::new(FakeSubmitter::accepting()).with_level(SchemaLevel::New);
    fill_users(&mut editor);
    assert_eq!(editor.level(), SchemaLevel::New);

    let preview = editor.preview_schema().unwrap();
    assert_eq!(preview.level, SchemaLevel::New);

    editor.submit().unwrap();
    assert_eq!(editor.submitter().requests()[0].schema, preview);
}

#[test]
fn invalid_draft_is_kept_and_never_sent() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    editor.dispatch(EditorEvent::AppendField);
    editor.dispatch(EditorEvent::AppendField);

    let err = editor.submit().unwrap_err();
    match &err {
        SubmitError::Invalid(issues) => assert_eq!(issues.len(), 3),
        other => panic!("expected validation issues, got {other:?}"),
    }
    assert_eq!(err.status_code(), ::http::StatusCode::UNPROCESSABLE_ENTITY);

    assert!(editor.submitter().requests().is_empty());
    assert_eq!(editor.draft().fields.len(), 2);
    match editor.status() {
        EditorStatus::Invalid { issues } => {
            assert_eq!(issues[0].field, None);
            assert_eq!(issues[1].field, Some(0));
            assert_eq!(issues[2].field, Some(1));
        }
        other => panic!("expected invalid status, got {other:?}"),
    }
}

#[test]
fn duplicate_names_are_caught_at_submit() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    fill_users(&mut editor);
    editor.dispatch(EditorEvent::UpdateField {
        index: 1,
        patch: FieldPatch::default().name("email"),
    });

    let err = editor.submit().unwrap_err();
    assert!(matches!(err, SubmitError::Invalid(ref issues) if issues.len() == 1));
}

#[test]
fn backend_failure_keeps_the_draft() {
    let mut editor = CollectionEditor::new(FakeSubmitter::failing(SubmissionError::Rejected(
        "collection exists".into(),
    )));
    fill_users(&mut editor);
    let before = editor.draft();

    let err = editor.submit().unwrap_err();
    assert_eq!(
        err,
        SubmitError::Submission(SubmissionError::Rejected("collection exists".into()))
    );
    assert_eq!(err.status_code(), ::http::StatusCode::BAD_GATEWAY);
    assert_eq!(*editor.draft(), *before);
    assert_eq!(
        *editor.status(),
        EditorStatus::Failed {
            message: "backend rejected collection: collection exists".into()
        }
    );
}

#[test]
fn failed_submit_can_be_retried() {
    let mut editor = CollectionEditor::new(FlakySubmitter {
        calls: AtomicUsize::new(0),
    });
    fill_users(&mut editor);

    editor.dispatch(EditorEvent::Submit);
    assert!(matches!(editor.status(), EditorStatus::Failed { .. }));

    editor.dispatch(EditorEvent::Submit);
    assert!(matches!(editor.status(), EditorStatus::Created { .. }));
    assert!(editor.draft().fields.is_empty());
}

#[test]
fn editing_clears_a_previous_outcome() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    editor.dispatch(EditorEvent::Submit);
    assert!(matches!(editor.status(), EditorStatus::Invalid { .. }));

    editor.dispatch(EditorEvent::SetName {
        value: "users".into(),
    });
    assert_eq!(*editor.status(), EditorStatus::Editing);
}

#[test]
fn subscribers_follow_edits_and_the_reset_after_submit() {
    let mut editor = CollectionEditor::new(FakeSubmitter::accepting());
    let mut rx = editor.subscribe();

    fill_users(&mut editor);
    assert_eq!(rx.borrow_and_update().fields.len(), 2);

    editor.submit().unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().fields.is_empty());
}

// ── Wire format ─────────────────────────────────────────────────

#[test]
fn events_deserialize_from_tagged_json() {
    let event: EditorEvent = serde_json::from_str(
        r#"{"event":"update_field","index":0,"patch":{"name":"email","type":"Email","required":true}}"#,
    )
    .unwrap();
    assert_eq!(
        event,
        EditorEvent::UpdateField {
            index: 0,
            patch: FieldPatch::default()
                .name("email")
                .field_type(FieldType::Email)
                .required(true),
        }
    );

    let event: EditorEvent = serde_json::from_str(r#"{"event":"append_field"}"#).unwrap();
    assert_eq!(event, EditorEvent::AppendField);

    assert!(serde_json::from_str::<EditorEvent>(r#"{"event":"explode"}"#).is_err());
}

#[test]
fn status_serializes_with_a_state_tag() {
    let status = EditorStatus::Invalid {
        issues: vec![Issue {
            field: Some(1),
            message: "field 1: name must not be empty".into(),
        }],
    };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "invalid");
    assert_eq!(json["issues"][0]["field"], 1);

    let json = serde_json::to_value(EditorStatus::Editing).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "editing" }));
}
