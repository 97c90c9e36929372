use thiserror::Error;

/// Failure of a single price or yield source. Resolvers recover from every variant by
/// moving on to the next source, so these never reach the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("data source `{source_name}` is unavailable: {detail}")]
    Unavailable { source_name: String, detail: String },
    #[error("no usable data for `{key}` from `{source_name}`")]
    Empty { source_name: String, key: String },
    #[error("malformed response from `{source_name}`: {detail}")]
    Malformed { source_name: String, detail: String },
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unavailable { source_name: source_name.into(), detail: detail.into() }
    }

    pub fn empty(source_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Empty { source_name: source_name.into(), key: key.into() }
    }

    pub fn malformed(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed { source_name: source_name.into(), detail: detail.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}
