#![allow(clippy::needless_doctest_main)]
//! `http_intercept` intercepts the outbound HTTP calls of a client library under test and
//! replies with deterministic, programmable responses.
//!
//! The same test suite can run against three interception backends:
//! - [`ServerBackend`], over a fetch-style network primitive with streamed request bodies;
//! - [`AdapterBackend`], over a request library with a pluggable adapter;
//! - [`BrowserBackend`], over a process-wide `XMLHttpRequest` hook.
//!
//! They all implement [`MockFacade`]: whichever backend is active, a rule behaves the same.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Responses](#responses)
//! 3. [Lifecycle](#lifecycle)
//! 4. [Passthrough and timeouts](#passthrough-and-timeouts)
//! 5. [In-memory responses](#in-memory-responses)
//!
//! ## Getting started
//! ```rust
//! use http_intercept::adapter_client::AdapterClient;
//! use http_intercept::{HttpMock, MockFacade, MockResponse};
//!
//! #[async_std::main]
//! async fn main() {
//!     let client = AdapterClient::new();
//!     let http_mock = HttpMock::adapter(Some(&client)).unwrap();
//!
//!     // Interception is only active between `setup` and `teardown`.
//!     http_mock.setup();
//!     http_mock.get(
//!         "https://example.com/hello",
//!         MockResponse::with_status(200).set_body_json(serde_json::json!({ "hello": "world" })),
//!     );
//!
//!     let response = client.get("https://example.com/hello").await.unwrap();
//!     assert_eq!(response.status, 200);
//!     assert_eq!(response.data["hello"], "world");
//!
//!     // Requests no rule covers are not swallowed: they fail.
//!     assert!(client.get("https://example.com/missing").await.is_err());
//!
//!     http_mock.teardown();
//! }
//! ```
//!
//! Use [`get_http_mock`] to pick the backend from an [`Environment`] once, at startup.
//!
//! ## Responses
//!
//! A [`ResponseSpec`] is either static data, a [`MockResponse`], or a function computing a
//! `MockResponse` from the intercepted request (see [`Respond`]).
//! Every field of a `MockResponse` is optional: a missing status is `200`, a missing body an
//! empty JSON object, missing headers an empty mapping.
//!
//! Response functions receive a [`CapturedRequest`]: the URL, the upper-cased method, the headers
//! and the fully materialized body of the request. A failing response function fails the request.
//!
//! ## Lifecycle
//!
//! [`MockFacade::setup`] installs interception, [`MockFacade::teardown`] removes it. Both drop all
//! registered rules and the call history: after `teardown` and `setup`, nothing registered
//! before is observable.
//!
//! ## Passthrough and timeouts
//!
//! [`MockFacade::pass_through`] sends requests to the real network path, an [`Upstream`].
//! [`MockFacade::timeout`] makes matching requests hang, to exercise your client's timeouts:
//! tests relying on it must enforce their own deadline.
//!
//! ## In-memory responses
//!
//! [`InMemoryResponse`] is an already completed response for code paths that never touch the
//! network. It exposes the views of the [`HttpResponse`] contract.
pub mod adapter_client;
mod backend;
mod config;
mod error;
mod facade;
pub mod http;
mod in_memory_response;
mod reply;
mod request;
mod respond;
mod response_spec;
mod rule_set;
mod upstream;
mod url_filter;
pub mod xhr;

pub use backend::{AdapterBackend, AdapterBackendBuilder, BrowserBackend, Fetch, ServerBackend};
pub use config::{Environment, MockConfig, HANG_DELAY};
pub use error::{DynError, Error};
pub use facade::{get_http_mock, get_http_mock_with_config, HttpMock, MockFacade};
pub use in_memory_response::{BodyStream, HttpResponse, InMemoryResponse};
pub use request::{BodyPrintLimit, CapturedRequest, Headers, RequestBody, BODY_PRINT_LIMIT};
pub use respond::Respond;
pub use response_spec::{MockResponse, ResponseSpec};
pub use upstream::{HyperUpstream, Upstream};
pub use url_filter::{MatchRule, UrlFilter};
