use alchemy_schema::ValidationError;

/// The backend could not take the collection. Retrying may succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend rejected collection: {0}")]
    Rejected(String),

    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl SubmissionError {
    pub fn status_code(&self) -> http::StatusCode {
        http::StatusCode::BAD_GATEWAY
    }
}

/// Why a submit did not create a collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("draft has {} validation issue(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl SubmitError {
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            SubmitError::Invalid(_) => http::StatusCode::UNPROCESSABLE_ENTITY,
            SubmitError::Submission(e) => e.status_code(),
        }
    }
}

impl From<Vec<ValidationError>> for SubmitError {
    fn from(issues: Vec<ValidationError>) -> Self {
        SubmitError::Invalid(issues)
    }
}
