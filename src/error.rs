use thiserror::Error;

/// Errors that can occur during geocoding operations
#[derive(Error, Debug)]
pub enum GeocodingError {
    #[error("HTTP request error")]
    Request(#[from] reqwest::Error),
    /// A failure reported by a custom [`HttpAdapter`](blocking/trait.HttpAdapter.html)
    #[error("HTTP transport error: {0}")]
    Transport(String),
    /// The service answered with an `error` field in its body
    #[error("{0}")]
    Api(String),
    #[error("Error decoding the response")]
    Json(#[from] serde_json::Error),
}
