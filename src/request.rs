use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use hyper::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

pub const BODY_PRINT_LIMIT: usize = 10_000;

/// Plain name/value header mapping, as handed to dynamic responses and adapter configs.
///
/// Header names are forwarded with whatever casing the intercepted client used.
pub type Headers = HashMap<String, String>;

/// Specifies limitations on printing request bodies when logging requests. Some clients
/// send bodies that are too large to reasonably print and it may be desirable to limit them.
#[derive(Debug, Copy, Clone)]
pub enum BodyPrintLimit {
    /// Maximum length of a body to print in bytes.
    Limited(usize),
    /// There is no limit to the size of a body that may be printed.
    Unlimited,
}

/// The fully materialized body of an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Bytes drained from a stream or written by the client.
    Raw(Bytes),
    /// Structured data, as carried by adapter-style clients.
    Json(Value),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Raw(bytes) => bytes.is_empty(),
            RequestBody::Json(_) => false,
        }
    }

    /// The body as it would travel on the wire.
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            RequestBody::Empty => Cow::Borrowed(&[]),
            RequestBody::Raw(bytes) => Cow::Borrowed(bytes.as_ref()),
            RequestBody::Json(value) => Cow::Owned(value.to_string().into_bytes()),
        }
    }

    pub(crate) fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Raw(bytes)
        }
    }
}

/// The normalized view of an intercepted request, independent of the backend that caught it.
///
/// Every backend extracts this once, when the request is intercepted: streamed bodies are drained
/// and the method is upper-cased. Rules and dynamic responses only ever see a `CapturedRequest`,
/// never the client's native request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub body: RequestBody,
}

impl CapturedRequest {
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.body {
            RequestBody::Json(value) => T::deserialize(value),
            body => serde_json::from_slice(&body.as_bytes()),
        }
    }

    /// Build the request that goes out on the real network path.
    pub(crate) fn to_http(&self) -> Result<http::Request<Bytes>, Error> {
        let mut builder = http::Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str());
        if let Some(headers) = builder.headers_mut() {
            *headers = to_header_map(&self.headers)?;
        }
        builder
            .body(Bytes::from(self.body.as_bytes().into_owned()))
            .map_err(|e| Error::Upstream(Box::new(e)))
    }

    pub(crate) fn print_with_limit(
        &self,
        mut buffer: impl fmt::Write,
        body_print_limit: BodyPrintLimit,
    ) -> fmt::Result {
        writeln!(buffer, "{} {}", self.method, self.url)?;
        let headers: BTreeMap<_, _> = self.headers.iter().collect();
        for (name, value) in headers {
            writeln!(buffer, "{}: {}", name, value)?;
        }

        let body = self.body.as_bytes();
        match body_print_limit {
            BodyPrintLimit::Limited(limit) if body.len() > limit => {
                let mut written = false;
                for end_byte in limit..(limit + 4).min(body.len()) {
                    if let Ok(truncated) = std::str::from_utf8(&body[..end_byte]) {
                        written = true;
                        writeln!(buffer, "{}", truncated)?;
                        writeln!(
                            buffer,
                            "We truncated the body because it was too large: {} bytes (limit: {} bytes)",
                            body.len(),
                            limit
                        )?;
                        writeln!(
                            buffer,
                            "Increase this limit by setting `HTTP_INTERCEPT_BODY_PRINT_LIMIT`, or calling `MockConfig::body_print_limit`"
                        )?;
                        break;
                    }
                }
                if !written {
                    writeln!(
                        buffer,
                        "Body is likely binary (invalid utf-8) size is {} bytes",
                        body.len()
                    )
                } else {
                    Ok(())
                }
            }
            _ => {
                if let Ok(body) = std::str::from_utf8(&body) {
                    writeln!(buffer, "{}", body)
                } else {
                    writeln!(
                        buffer,
                        "Body is likely binary (invalid utf-8) size is {} bytes",
                        body.len()
                    )
                }
            }
        }
    }
}

impl fmt::Display for CapturedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_with_limit(f, BodyPrintLimit::Limited(BODY_PRINT_LIMIT))
    }
}

/// Upper-case a method string and parse it, so that `"get"`, `"Get"` and `"GET"` are one method.
pub(crate) fn normalize_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::Configuration(format!("`{}` is not a valid HTTP method", method)))
}

/// The upper-case spelling of `method`: registered rules and captured requests agree on it.
pub(crate) fn canonical_method(method: Method) -> Method {
    if method.as_str().bytes().any(|b| b.is_ascii_lowercase()) {
        normalize_method(method.as_str()).unwrap_or(method)
    } else {
        method
    }
}

/// Flatten a `HeaderMap` into a plain mapping. Repeated headers are joined with `", "`.
pub(crate) fn from_header_map(headers: &HeaderMap) -> Headers {
    let mut flattened = Headers::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect::<Vec<_>>();
        flattened.insert(name.to_string(), values.join(", "));
    }
    flattened
}

pub(crate) fn to_header_map(headers: &Headers) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(format!("{}: {}", name, value)))?;
        map.append(name, value);
    }
    Ok(map)
}
