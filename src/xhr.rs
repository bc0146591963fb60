//! A browser-style `XMLHttpRequest`.
//!
//! When a [`BrowserBackend`](crate::BrowserBackend) is set up, every `XmlHttpRequest` in the
//! process is routed through its hook. Otherwise requests go to the request's own upstream.
use crate::backend::browser::{active_hook, MockXhrRequest};
use crate::error::Error;
use crate::request::{from_header_map, normalize_method, to_header_map, Headers};
use crate::{HyperUpstream, Upstream};
use http::StatusCode;
use hyper::body::Bytes;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use url::Url;

/// ### Example:
/// ```rust
/// use http_intercept::xhr::XmlHttpRequest;
/// use http_intercept::{BrowserBackend, MockFacade, MockResponse};
///
/// #[async_std::main]
/// async fn main() {
///     let backend = BrowserBackend::new();
///     backend.setup();
///     backend.get("http://localhost/greeting", MockResponse::new().set_body_string("hi"));
///
///     let mut xhr = XmlHttpRequest::new();
///     // Relative URLs are resolved against the backend's base url.
///     xhr.open("get", "/greeting");
///     let response = xhr.send(None::<Vec<u8>>).await.unwrap();
///
///     assert_eq!(response.response_text(), "hi");
///     backend.teardown();
/// }
/// ```
pub struct XmlHttpRequest {
    method: Option<String>,
    url: Option<String>,
    headers: Headers,
    upstream: Arc<dyn Upstream>,
}

impl XmlHttpRequest {
    pub fn new() -> Self {
        Self::with_upstream(HyperUpstream::new())
    }

    /// The network path used when no browser backend is set up.
    pub fn with_upstream<U: Upstream + 'static>(upstream: U) -> Self {
        Self {
            method: None,
            url: None,
            headers: Headers::new(),
            upstream: Arc::new(upstream),
        }
    }

    pub fn open<M: Into<String>, U: Into<String>>(&mut self, method: M, url: U) {
        self.method = Some(method.into());
        self.url = Some(url.into());
    }

    pub fn set_request_header<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.headers.insert(name.into(), value.into());
    }

    pub async fn send<B: Into<Bytes>>(self, body: Option<B>) -> Result<XhrResponse, Error> {
        let (method, url) = match (self.method, self.url) {
            (Some(method), Some(url)) => (method, url),
            _ => {
                return Err(Error::Configuration(
                    "`open` must be called before `send`".to_string(),
                ))
            }
        };
        let body = body.map(Into::into).unwrap_or_default();

        match active_hook() {
            Some(hook) => {
                let url = hook
                    .base_url()
                    .join(&url)
                    .map_err(|e| Error::Configuration(format!("Invalid url `{}`: {}", url, e)))?;
                hook.handle(MockXhrRequest::new(method, url, self.headers, body))
                    .await
            }
            None => {
                let url = Url::parse(&url)
                    .map_err(|e| Error::Configuration(format!("Invalid url `{}`: {}", url, e)))?;
                let mut request = http::Request::new(body);
                *request.method_mut() = normalize_method(&method)?;
                *request.uri_mut() = url
                    .as_str()
                    .parse()
                    .map_err(|e| Error::Upstream(Box::new(e)))?;
                *request.headers_mut() = to_header_map(&self.headers)?;
                let response = self.upstream.send(request).await?;
                Ok(XhrResponse::from_http(response))
            }
        }
    }
}

impl Default for XmlHttpRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// A completed `XMLHttpRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct XhrResponse {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Bytes,
}

impl XhrResponse {
    pub fn response_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub(crate) fn from_http(response: http::Response<Bytes>) -> Self {
        XhrResponse {
            status: response.status(),
            headers: from_header_map(response.headers()),
            body: response.into_body(),
        }
    }
}
