//! A minimal request library with request interceptors and a pluggable adapter.
//!
//! This is the client [`AdapterBackend`](crate::AdapterBackend) mocks: the backend installs a
//! request interceptor at construction time and swaps the client's adapter while it is set up.
//! Bodies are buffered, structured JSON values - there is no streaming here.
use crate::backend::adapter::InstalledMock;
use crate::error::Error;
use crate::request::{normalize_method, to_header_map, Headers};
use crate::{HyperUpstream, Upstream};
use async_trait::async_trait;
use http::StatusCode;
use hyper::body::Bytes;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Everything the client knows about an outgoing request.
///
/// `method` keeps the casing the caller used until interceptors rewrite it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub url: String,
    pub method: String,
    pub headers: Headers,
    pub data: Option<Value>,
}

impl RequestConfig {
    pub fn new<M: Into<String>, U: Into<String>>(method: M, url: U) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn data<T: Into<Value>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// The `(status, data, headers)` triple an adapter resolves with, plus the config that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterResponse {
    pub status: StatusCode,
    pub data: Value,
    pub headers: Headers,
    pub config: RequestConfig,
}

/// Performs the request described by a [`RequestConfig`].
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn call(&self, config: RequestConfig) -> Result<AdapterResponse, Error>;
}

/// The default adapter: sends requests over an [`Upstream`].
///
/// JSON response bodies are decoded, anything else is returned as a string.
pub struct HttpAdapter {
    upstream: Arc<dyn Upstream>,
}

impl HttpAdapter {
    pub fn new<U: Upstream + 'static>(upstream: U) -> Self {
        Self {
            upstream: Arc::new(upstream),
        }
    }
}

#[async_trait]
impl Adapter for HttpAdapter {
    async fn call(&self, config: RequestConfig) -> Result<AdapterResponse, Error> {
        let body = match &config.data {
            None | Some(Value::Null) => Bytes::new(),
            Some(Value::String(text)) => Bytes::from(text.clone()),
            Some(value) => Bytes::from(value.to_string()),
        };
        let mut request = http::Request::new(body);
        *request.method_mut() = normalize_method(&config.method)?;
        *request.uri_mut() = config
            .url
            .parse()
            .map_err(|e| Error::Upstream(Box::new(e)))?;
        *request.headers_mut() = to_header_map(&config.headers)?;

        let response = self.upstream.send(request).await?;
        let data = if response.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(response.body()).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(response.body()).into_owned())
            })
        };
        Ok(AdapterResponse {
            status: response.status(),
            data,
            headers: crate::request::from_header_map(response.headers()),
            config,
        })
    }
}

type RequestInterceptor = Arc<dyn Fn(RequestConfig) -> RequestConfig + Send + Sync>;

pub(crate) struct ClientState {
    pub(crate) adapter: Arc<dyn Adapter>,
    interceptors: Vec<RequestInterceptor>,
    upper_cases_methods: bool,
    /// The mock adapter currently installed by an `AdapterBackend`, if any.
    pub(crate) mock: Option<InstalledMock>,
}

/// A cloneable handle to a request library instance. Clones share adapter and interceptors.
#[derive(Clone)]
pub struct AdapterClient {
    state: Arc<RwLock<ClientState>>,
}

impl AdapterClient {
    /// A client sending real requests with [`HyperUpstream`].
    pub fn new() -> Self {
        Self::with_adapter(HttpAdapter::new(HyperUpstream::new()))
    }

    pub fn with_adapter<A: Adapter + 'static>(adapter: A) -> Self {
        Self {
            state: Arc::new(RwLock::new(ClientState {
                adapter: Arc::new(adapter),
                interceptors: vec![],
                upper_cases_methods: false,
                mock: None,
            })),
        }
    }

    /// Register a function rewriting every outgoing request config, in registration order.
    pub fn add_request_interceptor<F>(&self, interceptor: F)
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        self.state
            .write()
            .expect("Poisoned lock!")
            .interceptors
            .push(Arc::new(interceptor));
    }

    /// Upper-case the method of every outgoing request. Installed at most once per client.
    pub(crate) fn upper_case_methods(&self) {
        let mut state = self.state.write().expect("Poisoned lock!");
        if !state.upper_cases_methods {
            state.upper_cases_methods = true;
            state.interceptors.push(Arc::new(|config: RequestConfig| RequestConfig {
                method: config.method.to_ascii_uppercase(),
                ..config
            }));
        }
    }

    /// The number of registered request interceptors.
    pub fn interceptor_count(&self) -> usize {
        self.state.read().expect("Poisoned lock!").interceptors.len()
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut ClientState) -> R) -> R {
        f(&mut self.state.write().expect("Poisoned lock!"))
    }

    pub fn adapter(&self) -> Arc<dyn Adapter> {
        self.state.read().expect("Poisoned lock!").adapter.clone()
    }

    /// Install `adapter`, returning the one it replaces.
    pub fn set_adapter(&self, adapter: Arc<dyn Adapter>) -> Arc<dyn Adapter> {
        let mut state = self.state.write().expect("Poisoned lock!");
        std::mem::replace(&mut state.adapter, adapter)
    }

    pub async fn request(&self, config: RequestConfig) -> Result<AdapterResponse, Error> {
        let (adapter, interceptors) = {
            let state = self.state.read().expect("Poisoned lock!");
            (state.adapter.clone(), state.interceptors.clone())
        };
        let config = interceptors
            .iter()
            .fold(config, |config, interceptor| interceptor(config));
        adapter.call(config).await
    }

    pub async fn get<U: Into<String>>(&self, url: U) -> Result<AdapterResponse, Error> {
        self.request(RequestConfig::new("get", url)).await
    }

    pub async fn post<U: Into<String>, T: Into<Value>>(
        &self,
        url: U,
        data: T,
    ) -> Result<AdapterResponse, Error> {
        self.request(RequestConfig::new("post", url).data(data)).await
    }

    pub async fn put<U: Into<String>, T: Into<Value>>(
        &self,
        url: U,
        data: T,
    ) -> Result<AdapterResponse, Error> {
        self.request(RequestConfig::new("put", url).data(data)).await
    }
}

impl Default for AdapterClient {
    fn default() -> Self {
        Self::new()
    }
}
