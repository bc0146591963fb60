use crate::error::Error;
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use log::debug;
use std::sync::Arc;

/// The real network path: where requests go when they are passed through.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, Error>;
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for Arc<U> {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, Error> {
        (**self).send(request).await
    }
}

/// An [`Upstream`] performing real HTTP/1 requests with `hyper`.
#[derive(Clone)]
pub struct HyperUpstream {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperUpstream {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Default for HyperUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Upstream for HyperUpstream {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, Error> {
        debug!("Passing {} {} through to the network.", request.method(), request.uri());
        let response = self
            .client
            .request(request.map(Full::new))
            .await
            .map_err(|e| Error::Upstream(Box::new(e)))?;
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::Upstream(Box::new(e)))?
            .to_bytes();
        Ok(http::Response::from_parts(parts, body))
    }
}
