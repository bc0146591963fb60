use crate::error::{DynError, Error};
use crate::request::{to_header_map, Headers};
use crate::CapturedRequest;
use http::{HeaderMap, StatusCode};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use serde_json::Value;

/// A streamed response body.
pub type BodyStream = BoxBody<Bytes, DynError>;

/// The views every response exposes, whether it is streamed from the network or already in memory.
pub trait HttpResponse {
    /// The request this response answers.
    fn request(&self) -> &CapturedRequest;

    fn status(&self) -> StatusCode;

    fn headers(&self) -> &HeaderMap;

    /// The raw body text, if there is one.
    fn text_body(&self) -> Option<&str>;

    /// The body text decoded as JSON, if there is body text.
    fn parsed_body(&self) -> Result<Option<Value>, Error>;

    /// A body that was already deserialized by another codec.
    fn deserialized_body(&self) -> Option<&Value>;

    /// The body as binary content. Never fails: no body is empty content.
    fn blob_body(&self) -> Bytes;

    /// The body as a stream, for responses that support it.
    fn readable_stream_body(&self) -> Result<BodyStream, Error>;
}

/// A completed response that never touched the network.
///
/// `InMemoryResponse` is immutable: all views are computed on demand from the stored text
/// or deserialized body.
#[derive(Debug, Clone)]
pub struct InMemoryResponse {
    request: CapturedRequest,
    status: StatusCode,
    headers: HeaderMap,
    body_text: Option<String>,
    deserialized_body: Option<Value>,
}

impl InMemoryResponse {
    pub fn new(request: CapturedRequest, status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            request,
            status,
            headers,
            body_text: None,
            deserialized_body: None,
        }
    }

    /// Build a response from a plain name/value header mapping.
    pub fn with_raw_headers(
        request: CapturedRequest,
        status: StatusCode,
        headers: &Headers,
    ) -> Result<Self, Error> {
        Ok(Self::new(request, status, to_header_map(headers)?))
    }

    pub fn body_text<T: Into<String>>(mut self, text: T) -> Self {
        self.body_text = Some(text.into());
        self
    }

    pub fn deserialized<T: Into<Value>>(mut self, body: T) -> Self {
        self.deserialized_body = Some(body.into());
        self
    }
}

impl HttpResponse for InMemoryResponse {
    fn request(&self) -> &CapturedRequest {
        &self.request
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn text_body(&self) -> Option<&str> {
        self.body_text.as_deref()
    }

    fn parsed_body(&self) -> Result<Option<Value>, Error> {
        match &self.body_text {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn deserialized_body(&self) -> Option<&Value> {
        self.deserialized_body.as_ref()
    }

    fn blob_body(&self) -> Bytes {
        Bytes::from(self.body_text.clone().unwrap_or_default())
    }

    fn readable_stream_body(&self) -> Result<BodyStream, Error> {
        Err(Error::Unsupported(
            "an in-memory response has no streaming body",
        ))
    }
}
