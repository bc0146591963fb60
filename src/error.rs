use http::Method;

/// A boxed error, as produced by response functions, body streams and upstream transports.
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong while intercepting a request or reading an in-memory response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend was built without a collaborator it cannot work without.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    /// No rule and no passthrough covered the request.
    #[error("No mock matched {method} {url}")]
    Unmatched { method: Method, url: String },
    /// A dynamic response function failed.
    #[error("The response function failed")]
    Responder(#[source] DynError),
    /// Draining a streamed request body failed.
    #[error("Failed to read the request body")]
    Body(#[source] DynError),
    /// The real network path failed while passing a request through.
    #[error("The upstream transport failed")]
    Upstream(#[source] DynError),
    #[error("Failed to parse the response body as JSON")]
    Parse(#[from] serde_json::Error),
    /// The operation is not available for this kind of response.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}
