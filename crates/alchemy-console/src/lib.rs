mod config;
mod editor;
mod error;
mod event;
mod graphql;
pub mod http;
mod rows;
mod store;
mod submit;

pub use config::{ConfigError, ConsoleConfig};
pub use editor::{CollectionEditor, EditorStatus, Issue};
pub use error::{SubmissionError, SubmitError};
pub use event::EditorEvent;
pub use graphql::GraphqlSubmitter;
pub use http::ConsoleHttp;
pub use rows::{EditorView, FieldRow, RowControl, field_rows, heading};
pub use store::{DraftSnapshot, DraftStore};
pub use submit::{CollectionCreated, CreateCollection, Submitter};
