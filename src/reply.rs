//! Turning a [`ResponseSpec`] into a concrete reply.
//!
//! Every backend goes through [`Reply`]: defaults are applied here, and only here, so the
//! three backends answer identically for the same `ResponseSpec`. Backends then translate
//! a `Reply` into their client's native response shape.
use crate::error::Error;
use crate::request::Headers;
use crate::{CapturedRequest, MockResponse, ResponseSpec};
use http::header::CONTENT_TYPE;
use http::StatusCode;
use hyper::body::Bytes;
use log::debug;
use serde_json::Value;

/// A `MockResponse` with every default filled in.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reply {
    pub(crate) status: StatusCode,
    pub(crate) body: Value,
    pub(crate) headers: Headers,
}

impl From<MockResponse> for Reply {
    fn from(response: MockResponse) -> Self {
        Self {
            status: response.status.unwrap_or(StatusCode::OK),
            body: response.body.unwrap_or_else(|| Value::Object(Default::default())),
            headers: response.headers.unwrap_or_default(),
        }
    }
}

impl Reply {
    /// Compute the reply for `request`, awaiting the response function for dynamic specs.
    pub(crate) async fn compute(spec: &ResponseSpec, request: CapturedRequest) -> Result<Self, Error> {
        match spec {
            ResponseSpec::Static(response) => Ok(response.clone().into()),
            ResponseSpec::Dynamic(responder) => {
                debug!("Computing a dynamic response for {} {}.", request.method, request.url);
                let response = responder.respond(request).await.map_err(Error::Responder)?;
                Ok(response.into())
            }
        }
    }

    /// The body as it travels on the wire: strings verbatim, `null` as nothing, JSON otherwise.
    pub(crate) fn body_bytes(&self) -> Bytes {
        match &self.body {
            Value::Null => Bytes::new(),
            Value::String(text) => Bytes::from(text.clone()),
            value => Bytes::from(value.to_string()),
        }
    }

    /// The headers sent with a wire-encoded body, `content-type` included for JSON bodies.
    pub(crate) fn wire_headers(&self) -> Headers {
        let mut headers = self.headers.clone();
        let is_json = !matches!(self.body, Value::Null | Value::String(_));
        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        if is_json && !has_content_type {
            headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
        }
        headers
    }
}
