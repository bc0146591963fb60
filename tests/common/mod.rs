#![allow(dead_code)]
use async_trait::async_trait;
use http_body_util::Full;
use http_intercept::adapter_client::{Adapter, AdapterResponse, RequestConfig};
use http_intercept::{Error, Upstream};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const REAL_BODY: &str = "real network";

/// Stands in for the real network: answers `299 real network` and records what it received.
#[derive(Clone, Default)]
pub struct StubUpstream {
    pub received: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl StubUpstream {
    pub fn hits(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, Error> {
        self.received.lock().unwrap().push(request);
        Ok(http::Response::builder()
            .status(299)
            .header("x-real", "true")
            .body(Bytes::from_static(REAL_BODY.as_bytes()))
            .unwrap())
    }
}

/// The adapter an `AdapterClient` starts with: answers `299` with a string body.
#[derive(Clone, Default)]
pub struct StubAdapter {
    pub received: Arc<Mutex<Vec<RequestConfig>>>,
}

impl StubAdapter {
    pub fn hits(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl Adapter for StubAdapter {
    async fn call(&self, config: RequestConfig) -> Result<AdapterResponse, Error> {
        self.received.lock().unwrap().push(config.clone());
        Ok(AdapterResponse {
            status: http::StatusCode::from_u16(299).unwrap(),
            data: serde_json::Value::String(REAL_BODY.to_string()),
            headers: Default::default(),
            config,
        })
    }
}

/// A real HTTP/1 endpoint on a random local port, answering every request with `REAL_BODY`.
pub async fn start_real_endpoint() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind an OS port for the stub endpoint.");
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let service = service_fn(|_request: hyper::Request<Incoming>| async {
                    Ok::<_, Infallible>(hyper::Response::new(Full::new(Bytes::from_static(
                        REAL_BODY.as_bytes(),
                    ))))
                });
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    address
}
