use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid backend address `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The body was not JSON, or not the object the endpoint promises.
    #[error("{origin} returned a malformed payload")]
    MalformedPayload {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}
