use super::method_rule;
use crate::error::Error;
use crate::reply::Reply;
use crate::request::{normalize_method, Headers};
use crate::rule_set::{Action, Resolution, RuleSet, SharedRuleSet};
use crate::url_filter::canonical_url;
use crate::xhr::XhrResponse;
use crate::{
    CapturedRequest, MatchRule, MockConfig, MockFacade, RequestBody, ResponseSpec, Upstream,
    UrlFilter,
};
use http::{Method, StatusCode};
use hyper::body::Bytes;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};
use url::Url;

/// The process-wide `XMLHttpRequest` hook. At most one browser backend owns it at a time.
static XHR_HOOK: Lazy<RwLock<Option<XhrHook>>> = Lazy::new(|| RwLock::new(None));

/// The currently installed hook, if any.
pub(crate) fn active_hook() -> Option<XhrHook> {
    XHR_HOOK.read().expect("Poisoned lock!").clone()
}

/// Intercepts every [`XmlHttpRequest`](crate::xhr::XmlHttpRequest) in the process.
///
/// [`MockFacade::setup`] installs the global hook and [`MockFacade::teardown`] removes it.
/// Setting up a second backend replaces the hook of the first one: only the most recently
/// set up backend sees requests.
///
/// Filtered passthrough is not supported: [`MockFacade::pass_through`] with a filter logs a
/// warning and passes every request through.
pub struct BrowserBackend {
    hook: XhrHook,
}

impl BrowserBackend {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            hook: XhrHook {
                rules: RuleSet::shared(config.body_print_limit),
                upstream: config.upstream,
                base_url: config.base_url,
            },
        }
    }

    fn register(&self, rule: MatchRule, action: Action) {
        self.hook
            .rules
            .write()
            .expect("Poisoned lock!")
            .register(rule, action);
    }

    fn owns_hook(&self, hook: &Option<XhrHook>) -> bool {
        hook.as_ref()
            .map_or(false, |hook| Arc::ptr_eq(&hook.rules, &self.hook.rules))
    }
}

impl Default for BrowserBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFacade for BrowserBackend {
    fn setup(&self) {
        debug!("Setting up XMLHttpRequest interception.");
        let mut installed = XHR_HOOK.write().expect("Poisoned lock!");
        if installed.is_some() && !self.owns_hook(&installed) {
            warn!("Another browser mock was set up and is being replaced.");
            if let Some(previous) = installed.as_ref() {
                previous.rules.write().expect("Poisoned lock!").reset(false);
            }
        }
        self.hook.rules.write().expect("Poisoned lock!").reset(true);
        *installed = Some(self.hook.clone());
    }

    fn teardown(&self) {
        debug!("Tearing down XMLHttpRequest interception.");
        let mut installed = XHR_HOOK.write().expect("Poisoned lock!");
        if self.owns_hook(&installed) {
            *installed = None;
        }
        self.hook.rules.write().expect("Poisoned lock!").reset(false);
    }

    fn pass_through(&self, url: Option<UrlFilter>) {
        if url.is_some() {
            warn!("Browser mock doesn't support filtered passThrough calls.");
        }
        self.hook
            .rules
            .write()
            .expect("Poisoned lock!")
            .pass_through_all();
    }

    fn timeout(&self, method: Method, url: UrlFilter) {
        self.register(method_rule(method, url), Action::Hang);
    }

    fn mock_http_method(&self, method: Method, url: UrlFilter, response: ResponseSpec) {
        self.register(method_rule(method, url), Action::Reply(response));
    }

    fn received_requests(&self) -> Vec<CapturedRequest> {
        self.hook
            .rules
            .read()
            .expect("Poisoned lock!")
            .received_requests()
    }
}

#[derive(Clone)]
pub(crate) struct XhrHook {
    rules: SharedRuleSet,
    upstream: Arc<dyn Upstream>,
    base_url: Url,
}

impl XhrHook {
    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) async fn handle(&self, request: MockXhrRequest) -> Result<XhrResponse, Error> {
        let captured = CapturedRequest {
            url: canonical_url(request.url().as_str()),
            method: normalize_method(request.method())?,
            headers: request.headers().clone(),
            body: RequestBody::from_bytes(request.body().clone()),
        };
        let resolution = self
            .rules
            .write()
            .expect("Poisoned lock!")
            .resolve(&captured);

        match resolution {
            Resolution::Inactive | Resolution::PassThrough => {
                let response = self.upstream.send(captured.to_http()?).await?;
                Ok(XhrResponse::from_http(response))
            }
            Resolution::Reply(spec) => {
                let reply = Reply::compute(&spec, captured).await?;
                Ok(MockXhrResponse::new()
                    .status(reply.status)
                    .headers(reply.wire_headers())
                    .body(reply.body_bytes())
                    .into())
            }
            Resolution::Hang => {
                debug!("{} {} will never resolve.", captured.method, captured.url);
                futures::future::pending().await
            }
            Resolution::Unmatched => Err(Error::Unmatched {
                method: captured.method,
                url: captured.url,
            }),
        }
    }
}

/// The request as the `XMLHttpRequest` hook sees it: the method in the casing the page used
/// and the URL resolved against the document location.
pub(crate) struct MockXhrRequest {
    method: String,
    url: Url,
    headers: Headers,
    body: Bytes,
}

impl MockXhrRequest {
    pub(crate) fn new(method: String, url: Url, headers: Headers, body: Bytes) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn body(&self) -> &Bytes {
        &self.body
    }
}

/// The synthetic reply, assembled with a setter chain.
pub(crate) struct MockXhrResponse {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl MockXhrResponse {
    fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

impl From<MockXhrResponse> for XhrResponse {
    fn from(response: MockXhrResponse) -> Self {
        XhrResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}
