use crate::request::Headers;
use crate::respond::Respond;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::convert::TryInto;
use std::fmt;
use std::sync::Arc;

/// The data returned for a mocked request: status, body and headers, each of them optional.
///
/// Missing fields are filled in only when the reply is produced: a `200` status,
/// an empty JSON object as body and no headers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MockResponse {
    pub status: Option<StatusCode>,
    pub body: Option<Value>,
    pub headers: Option<Headers>,
}

// `http_intercept` is a crate meant for testing - failures are most likely not handled/temporary
// mistakes. Hence the builder methods panic on invalid input instead of returning `Result`s.
impl MockResponse {
    /// An empty response: every field falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a `MockResponse` specifying the status code of the response.
    pub fn with_status<S>(s: S) -> Self
    where
        S: TryInto<StatusCode>,
        <S as TryInto<StatusCode>>::Error: std::fmt::Debug,
    {
        Self::new().set_status(s)
    }

    pub fn set_status<S>(mut self, s: S) -> Self
    where
        S: TryInto<StatusCode>,
        <S as TryInto<StatusCode>>::Error: std::fmt::Debug,
    {
        let status = s.try_into().expect("Failed to convert into status code.");
        self.status = Some(status);
        self
    }

    /// Set the response body from a JSON-serializable value.
    pub fn set_body_json<B: Serialize>(mut self, body: B) -> Self {
        let body = serde_json::to_value(body).expect("Failed to convert into body.");
        self.body = Some(body);
        self
    }

    /// Set the response body to a string, sent verbatim.
    pub fn set_body_string<T: Into<String>>(mut self, body: T) -> Self {
        self.body = Some(Value::String(body.into()));
        self
    }

    /// Insert a header `value` with `key` as header name, overriding any previous value.
    pub fn insert_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(key.into(), value.into());
        self
    }
}

/// What a rule replies with: fixed data, or a function computing it from the intercepted request.
#[derive(Clone)]
pub enum ResponseSpec {
    Static(MockResponse),
    Dynamic(Arc<dyn Respond>),
}

impl ResponseSpec {
    /// Wrap a [`Respond`] implementation - usually an async closure - as a dynamic response.
    pub fn dynamic<R: Respond + 'static>(responder: R) -> Self {
        ResponseSpec::Dynamic(Arc::new(responder))
    }
}

impl From<MockResponse> for ResponseSpec {
    fn from(response: MockResponse) -> Self {
        ResponseSpec::Static(response)
    }
}

impl fmt::Debug for ResponseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSpec::Static(response) => f.debug_tuple("Static").field(response).finish(),
            // Closures do not implement `Debug`.
            ResponseSpec::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
