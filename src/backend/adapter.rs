use super::method_rule;
use crate::adapter_client::{Adapter, AdapterClient, AdapterResponse, RequestConfig};
use crate::error::Error;
use crate::reply::Reply;
use crate::request::normalize_method;
use crate::rule_set::{Action, Resolution, RuleSet, SharedRuleSet};
use crate::url_filter::canonical_url;
use crate::{
    CapturedRequest, MatchRule, MockConfig, MockFacade, RequestBody, ResponseSpec, UrlFilter,
};
use async_trait::async_trait;
use http::Method;
use log::{debug, warn};
use std::sync::Arc;

/// Intercepts an [`AdapterClient`] by swapping its adapter.
///
/// Building the backend installs a request interceptor on the client that upper-cases
/// the method of every request, whatever casing the caller used. The interceptor is
/// installed once per client, however many backends are built on it.
/// [`MockFacade::setup`] installs the mock adapter, [`MockFacade::teardown`] restores the
/// original one.
///
/// A client is intercepted by one backend at a time: setting up a second backend on the same
/// client replaces the first one, which stops seeing requests. Tearing down the replaced
/// backend leaves the client alone.
///
/// Requests that are passed through go to the client's original adapter.
pub struct AdapterBackend {
    client: AdapterClient,
    rules: SharedRuleSet,
}

/// The mock adapter an [`AdapterBackend`] installed on a client.
pub(crate) struct InstalledMock {
    rules: SharedRuleSet,
    original: Arc<dyn Adapter>,
}

/// Assembles an [`AdapterBackend`]. A client is required.
#[derive(Default)]
pub struct AdapterBackendBuilder {
    client: Option<AdapterClient>,
    config: Option<MockConfig>,
}

impl AdapterBackendBuilder {
    pub fn client(mut self, client: &AdapterClient) -> Self {
        self.client = Some(client.clone());
        self
    }

    pub fn config(mut self, config: MockConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Fails with [`Error::Configuration`] if no client was provided. Nothing is installed
    /// on any client in that case.
    pub fn build(self) -> Result<AdapterBackend, Error> {
        let client = self.client.ok_or_else(|| {
            Error::Configuration("an adapter client instance is required".to_string())
        })?;
        let config = self.config.unwrap_or_default();

        client.upper_case_methods();

        Ok(AdapterBackend {
            client,
            rules: RuleSet::shared(config.body_print_limit),
        })
    }
}

impl AdapterBackend {
    pub fn builder() -> AdapterBackendBuilder {
        AdapterBackendBuilder::default()
    }

    /// Shorthand for `AdapterBackend::builder().client(client).build()` that accepts a missing client.
    pub fn new(client: Option<&AdapterClient>) -> Result<Self, Error> {
        let builder = Self::builder();
        match client {
            Some(client) => builder.client(client).build(),
            None => builder.build(),
        }
    }

    fn register(&self, rule: MatchRule, action: Action) {
        self.rules
            .write()
            .expect("Poisoned lock!")
            .register(rule, action);
    }
}

impl MockFacade for AdapterBackend {
    fn setup(&self) {
        debug!("Setting up adapter interception.");
        self.rules.write().expect("Poisoned lock!").reset(true);

        self.client.with_state(|state| {
            let original = match &state.mock {
                Some(installed) if Arc::ptr_eq(&installed.rules, &self.rules) => return,
                Some(installed) => {
                    warn!("Another adapter mock was set up on this client and is being replaced.");
                    installed.rules.write().expect("Poisoned lock!").reset(false);
                    installed.original.clone()
                }
                None => state.adapter.clone(),
            };
            state.adapter = Arc::new(MockAdapter {
                rules: self.rules.clone(),
                original: original.clone(),
            });
            state.mock = Some(InstalledMock {
                rules: self.rules.clone(),
                original,
            });
        });
    }

    fn teardown(&self) {
        debug!("Tearing down adapter interception.");
        self.rules.write().expect("Poisoned lock!").reset(false);

        self.client.with_state(|state| {
            let owned = matches!(
                &state.mock,
                Some(installed) if Arc::ptr_eq(&installed.rules, &self.rules)
            );
            if owned {
                if let Some(installed) = state.mock.take() {
                    state.adapter = installed.original;
                }
            }
        });
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

/// The adapter installed on the client while the backend is set up.
struct MockAdapter {
    rules: SharedRuleSet,
    original: Arc<dyn Adapter>,
}

#[async_trait]
impl Adapter for MockAdapter {
    async fn call(&self, config: RequestConfig) -> Result<AdapterResponse, Error> {
        let request = CapturedRequest {
            url: canonical_url(&config.url),
            method: normalize_method(&config.method)?,
            headers: config.headers.clone(),
            body: config
                .data
                .clone()
                .map_or(RequestBody::Empty, RequestBody::Json),
        };
        let resolution = self
            .rules
            .write()
            .expect("Poisoned lock!")
            .resolve(&request);

        match resolution {
            Resolution::Inactive | Resolution::PassThrough => self.original.call(config).await,
            Resolution::Reply(spec) => {
                let reply = Reply::compute(&spec, request).await?;
                Ok(AdapterResponse {
                    status: reply.status,
                    data: reply.body,
                    headers: reply.headers,
                    config,
                })
            }
            Resolution::Hang => {
                debug!("{} {} will never resolve.", request.method, request.url);
                futures::future::pending().await
            }
            Resolution::Unmatched => Err(Error::Unmatched {
                method: request.method,
                url: request.url,
            }),
        }
    }
}
