use alchemy_schema::CollectionSchema;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;

/// What the editor hands to the backend when the user asks for a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCollection {
    pub name: String,
    pub schema: CollectionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionCreated {
    pub name: String,
    pub fields: usize,
}

/// Persists a finished collection definition.
///
/// The console does not own collections; implementations forward the request
/// to whatever backend does. A failure here is never the user's fault, so the
/// editor keeps the draft and lets the user retry.
pub trait Submitter: Send + Sync {
    fn submit(&self, request: &CreateCollection) -> Result<CollectionCreated, SubmissionError>;
}
