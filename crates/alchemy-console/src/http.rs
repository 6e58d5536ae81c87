use std::sync::{Mutex, MutexGuard, PoisonError};

use alchemy_schema::{FieldType, SchemaLevel, render_sdl};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use serde::Serialize;

use crate::editor::{CollectionEditor, Issue};
use crate::error::SubmitError;
use crate::event::EditorEvent;
use crate::submit::Submitter;

/// JSON API over one collection editor.
///
/// Requests are applied one at a time behind a mutex, so an edit can never
/// interleave with a submit that is still talking to the backend.
pub struct ConsoleHttp<S: Submitter> {
    editor: Mutex<CollectionEditor<S>>,
}

impl<S: Submitter> ConsoleHttp<S> {
    pub fn new(submitter: S, level: SchemaLevel) -> Self {
        Self {
            editor: Mutex::new(CollectionEditor::new(submitter).with_level(level)),
        }
    }

    pub fn handle(&self, req: Request<Vec<u8>>) -> Response<Vec<u8>> {
        let path = req.uri().path();
        let method = req.method();

        match (method, path.trim_end_matches('/')) {
            (&Method::GET, "/healthz") => json_response(StatusCode::OK, r#"{"status":"ok"}"#),
            (&Method::GET, "/field-types") => self.field_types(),
            (&Method::GET, "/draft") => self.get_draft(),
            (&Method::DELETE, "/draft") => self.dispatch(EditorEvent::Reset),
            (&Method::GET, "/draft/schema") => self.get_schema(),
            (&Method::GET, "/draft/sdl") => self.get_sdl(),
            (&Method::GET, "/view") => self.get_view(),
            (&Method::POST, "/events") => self.post_event(&req),
            (&Method::POST, "/submit") => self.submit(),
            _ => json_response(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#),
        }
    }

    fn editor(&self) -> MutexGuard<'_, CollectionEditor<S>> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn field_types(&self) -> Response<Vec<u8>> {
        let labels: Vec<&str> = FieldType::ALL.iter().map(|t| t.label()).collect();
        to_json_response(StatusCode::OK, &labels)
    }

    fn get_draft(&self) -> Response<Vec<u8>> {
        let draft = self.editor().draft();
        to_json_response(StatusCode::OK, &*draft)
    }

    fn get_view(&self) -> Response<Vec<u8>> {
        let view = self.editor().view();
        to_json_response(StatusCode::OK, &view)
    }

    fn get_schema(&self) -> Response<Vec<u8>> {
        let preview = self.editor().preview_schema();
        match preview {
            Ok(schema) => to_json_response(StatusCode::OK, &schema),
            Err(issues) => issues_response(&issues),
        }
    }

    fn get_sdl(&self) -> Response<Vec<u8>> {
        let draft = self.editor().draft();
        let mut response = Response::new(render_sdl(&draft).into_bytes());
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }

    fn post_event(&self, req: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        let event: EditorEvent = match serde_json::from_slice(req.body()) {
            Ok(e) => e,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        self.dispatch(event)
    }

    fn dispatch(&self, event: EditorEvent) -> Response<Vec<u8>> {
        let mut editor = self.editor();
        editor.dispatch(event);
        to_json_response(StatusCode::OK, &editor.view())
    }

    fn submit(&self) -> Response<Vec<u8>> {
        let mut editor = self.editor();
        match editor.submit() {
            Ok(created) => to_json_response(StatusCode::CREATED, &created),
            Err(SubmitError::Invalid(issues)) => issues_response(&issues),
            Err(e) => error_response(e.status_code(), &e.to_string()),
        }
    }
}

fn issues_response(issues: &[alchemy_schema::ValidationError]) -> Response<Vec<u8>> {
    let issues: Vec<Issue> = issues.iter().map(Issue::from).collect();
    to_json_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        &serde_json::json!({ "error": "invalid draft", "issues": issues }),
    )
}

fn to_json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(body) => json_response(status, body),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn json_response(status: StatusCode, body: impl Into<Vec<u8>>) -> Response<Vec<u8>> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn error_response(status: StatusCode, message: &str) -> Response<Vec<u8>> {
    let body = serde_json::json!({ "error": message });
    json_response(status, body.to_string().into_bytes())
}
