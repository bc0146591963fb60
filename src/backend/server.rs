use super::method_rule;
use crate::error::{DynError, Error};
use crate::reply::Reply;
use crate::request::{canonical_method, from_header_map, to_header_map};
use crate::rule_set::{Action, Resolution, RuleSet, SharedRuleSet};
use crate::url_filter::canonical_url;
use crate::{
    CapturedRequest, MatchRule, MockConfig, MockFacade, RequestBody, ResponseSpec, Upstream,
    UrlFilter,
};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Intercepts a fetch-style network primitive, as found in server-side processes.
///
/// Clients under test issue requests through a [`Fetch`] handle obtained from
/// [`ServerBackend::fetcher`]. While the backend is set up, requests are matched against
/// the registered rules; otherwise they go straight to the real network.
///
/// ### Example:
/// ```rust
/// use http_intercept::{MockFacade, MockResponse, ServerBackend};
/// use http_body_util::{BodyExt, Empty};
/// use hyper::body::Bytes;
///
/// #[async_std::main]
/// async fn main() {
///     let backend = ServerBackend::new();
///     backend.setup();
///     backend.get("http://example.com/hello", MockResponse::with_status(201));
///
///     let request = http::Request::get("http://example.com/hello")
///         .body(Empty::<Bytes>::new())
///         .unwrap();
///     let response = backend.fetcher().fetch(request).await.unwrap();
///
///     assert_eq!(response.status(), 201);
///     let body = response.into_body().collect().await.unwrap().to_bytes();
///     assert_eq!(&body[..], b"{}");
///     backend.teardown();
/// }
/// ```
pub struct ServerBackend {
    rules: SharedRuleSet,
    fetch: Fetch,
}

impl ServerBackend {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        let rules = RuleSet::shared(config.body_print_limit);
        let fetch = Fetch {
            rules: rules.clone(),
            upstream: config.upstream,
            hang_delay: config.hang_delay,
        };
        Self { rules, fetch }
    }

    /// The network primitive to hand to the client under test.
    pub fn fetcher(&self) -> Fetch {
        self.fetch.clone()
    }

    fn register(&self, rule: MatchRule, action: Action) {
        self.rules
            .write()
            .expect("Poisoned lock!")
            .register(rule, action);
    }
}

impl Default for ServerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFacade for ServerBackend {
    fn setup(&self) {
        debug!("Setting up fetch interception.");
        self.rules.write().expect("Poisoned lock!").reset(true);
    }

    fn teardown(&self) {
        debug!("Tearing down fetch interception.");
        self.rules.write().expect("Poisoned lock!").reset(false);
    }

    fn pass_through(&self, url: Option<UrlFilter>) {
        match url {
            Some(url) => self.register(MatchRule::any_method(url), Action::PassThrough),
            None => self.rules.write().expect("Poisoned lock!").pass_through_all(),
        }
    }

    fn timeout(&self, method: Method, url: UrlFilter) {
        self.register(method_rule(method, url), Action::Hang);
    }

    fn mock_http_method(&self, method: Method, url: UrlFilter, response: ResponseSpec) {
        self.register(method_rule(method, url), Action::Reply(response));
    }

    fn received_requests(&self) -> Vec<CapturedRequest> {
        self.rules.read().expect("Poisoned lock!").received_requests()
    }
}

/// A fetch-style network primitive: takes a request with a (possibly streamed) body and
/// returns a fully buffered response.
#[derive(Clone)]
pub struct Fetch {
    rules: SharedRuleSet,
    upstream: Arc<dyn Upstream>,
    hang_delay: Duration,
}

impl Fetch {
    pub async fn fetch<B>(&self, request: http::Request<B>) -> Result<http::Response<Full<Bytes>>, Error>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<DynError>,
    {
        let request = capture(request).await?;
        let resolution = self
            .rules
            .write()
            .expect("Poisoned lock!")
            .resolve(&request);

        // The lock is released before awaiting.
        match resolution {
            Resolution::Inactive | Resolution::PassThrough => self.forward(&request).await,
            Resolution::Reply(spec) => {
                let reply = Reply::compute(&spec, request).await?;
                into_response(reply)
            }
            Resolution::Hang => {
                debug!("Holding {} {} for {:?}.", request.method, request.url, self.hang_delay);
                tokio::time::sleep(self.hang_delay).await;
                into_response(Reply {
                    status: StatusCode::GATEWAY_TIMEOUT,
                    body: serde_json::Value::Null,
                    headers: Default::default(),
                })
            }
            Resolution::Unmatched => Err(Error::Unmatched {
                method: request.method,
                url: request.url,
            }),
        }
    }

    async fn forward(&self, request: &CapturedRequest) -> Result<http::Response<Full<Bytes>>, Error> {
        let response = self.upstream.send(request.to_http()?).await?;
        Ok(response.map(Full::new))
    }
}

/// Drain the body stream and normalize the request. The body is fully read before anything
/// else looks at the request.
async fn capture<B>(request: http::Request<B>) -> Result<CapturedRequest, Error>
where
    B: Body<Data = Bytes>,
    B::Error: Into<DynError>,
{
    let (parts, body) = request.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| Error::Body(e.into()))?
        .to_bytes();

    Ok(CapturedRequest {
        url: canonical_url(&parts.uri.to_string()),
        method: canonical_method(parts.method),
        headers: from_header_map(&parts.headers),
        body: RequestBody::from_bytes(body),
    })
}

fn into_response(reply: Reply) -> Result<http::Response<Full<Bytes>>, Error> {
    let mut response = http::Response::new(Full::new(reply.body_bytes()));
    *response.status_mut() = reply.status;
    *response.headers_mut() = to_header_map(&reply.wire_headers())?;
    Ok(response)
}
