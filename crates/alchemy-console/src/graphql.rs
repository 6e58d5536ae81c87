use std::time::Duration;

use alchemy_schema::CollectionSchema;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;
use crate::submit::{CollectionCreated, CreateCollection, Submitter};

const CREATE_COLLECTION: &str = "mutation CreateCollection($name: String!, $schema: JSON!) { createCollection(name: $name, schema: $schema) }";

/// Submits collections to the backend's GraphQL endpoint with the
/// `createCollection` mutation.
pub struct GraphqlSubmitter {
    endpoint: String,
    agent: ureq::Agent,
}

impl GraphqlSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Serialize)]
struct Variables<'a> {
    name: &'a str,
    schema: &'a CollectionSchema,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<CreateCollectionData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCollectionData {
    create_collection: Option<bool>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

impl Submitter for GraphqlSubmitter {
    fn submit(&self, request: &CreateCollection) -> Result<CollectionCreated, SubmissionError> {
        let body = serde_json::to_vec(&GraphqlRequest {
            query: CREATE_COLLECTION,
            variables: Variables {
                name: &request.name,
                schema: &request.schema,
            },
        })
        .map_err(|e| SubmissionError::Transport(format!("encoding request: {e}")))?;

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("content-type", "application/json")
            .send(&body[..])
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply: GraphqlResponse = serde_json::from_str(&text)
            .map_err(|e| SubmissionError::Decode(e.to_string()))?;

        if let Some(error) = reply.errors.into_iter().next() {
            return Err(SubmissionError::Rejected(error.message));
        }

        match reply.data.and_then(|d| d.create_collection) {
            Some(true) => Ok(CollectionCreated {
                name: request.name.clone(),
                fields: request.schema.rule.properties.len(),
            }),
            Some(false) => Err(SubmissionError::Rejected(format!(
                "backend refused to create '{}'",
                request.name
            ))),
            None => Err(SubmissionError::Decode(
                "response has neither data nor errors".into(),
            )),
        }
    }
}
