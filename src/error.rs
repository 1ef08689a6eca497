/// Errors produced by the retrieval client and extraction layout setup.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The retrieval API answered with a non-success status.
    #[error("Failed to fetch: {status} {status_text}")]
    Fetch { status: u16, status_text: String },

    /// The response body did not match the expected envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
