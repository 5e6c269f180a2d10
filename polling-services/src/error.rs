use reqwest::StatusCode;
use thiserror::Error;

/// Failures of one poll tick or of one resource within a tick
#[derive(Debug, Error)]
pub enum PollError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("resource {resource} has an invalid id {id:?}: {source}")]
    InvalidResourceId {
        resource: String,
        id: String,
        #[source]
        source: uuid::Error,
    },

    #[error("failed to encode event {uid:?}: {source}")]
    Encode {
        uid: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to publish to {subject}: {message}")]
    Publish { subject: String, message: String },
}

impl PollError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }
}

pub type PollResult<T> = Result<T, PollError>;
