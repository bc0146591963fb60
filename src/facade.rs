use crate::adapter_client::AdapterClient;
use crate::error::Error;
use crate::{
    AdapterBackend, BrowserBackend, CapturedRequest, Environment, MockConfig, ResponseSpec,
    ServerBackend, UrlFilter,
};
use http::Method;

/// The operations every interception backend supports, with the same behaviour on all of them.
///
/// Rules are tried in registration order: the first rule matching the method and URL of a
/// request decides the reply. Requests matching no rule fail with
/// [`Error::Unmatched`](crate::Error::Unmatched).
pub trait MockFacade {
    /// Activate interception, dropping all rules and recorded requests.
    fn setup(&self);

    /// Deactivate interception and restore the real network path, dropping all rules and
    /// recorded requests. Safe to call if `setup` was never called.
    fn teardown(&self);

    /// Send matching requests - or every request, if `url` is `None` - to the real network.
    fn pass_through(&self, url: Option<UrlFilter>);

    /// Matching requests hang: they never resolve within a reasonable test timeframe.
    fn timeout(&self, method: Method, url: UrlFilter);

    /// Reply to requests with a matching method and URL according to `response`.
    fn mock_http_method(&self, method: Method, url: UrlFilter, response: ResponseSpec);

    /// All requests intercepted since the last `setup`, in arrival order.
    fn received_requests(&self) -> Vec<CapturedRequest>;

    fn get<U, R>(&self, url: U, response: R)
    where
        Self: Sized,
        U: Into<UrlFilter>,
        R: Into<ResponseSpec>,
    {
        self.mock_http_method(Method::GET, url.into(), response.into())
    }

    fn post<U, R>(&self, url: U, response: R)
    where
        Self: Sized,
        U: Into<UrlFilter>,
        R: Into<ResponseSpec>,
    {
        self.mock_http_method(Method::POST, url.into(), response.into())
    }

    fn put<U, R>(&self, url: U, response: R)
    where
        Self: Sized,
        U: Into<UrlFilter>,
        R: Into<ResponseSpec>,
    {
        self.mock_http_method(Method::PUT, url.into(), response.into())
    }
}

/// One of the three backends, chosen once at startup.
pub enum HttpMock {
    Server(ServerBackend),
    Adapter(AdapterBackend),
    Browser(BrowserBackend),
}

impl HttpMock {
    /// Mock an adapter client. Fails if `client` is `None`.
    pub fn adapter(client: Option<&AdapterClient>) -> Result<Self, Error> {
        AdapterBackend::new(client).map(HttpMock::Adapter)
    }

    fn backend(&self) -> &dyn MockFacade {
        match self {
            HttpMock::Server(backend) => backend,
            HttpMock::Adapter(backend) => backend,
            HttpMock::Browser(backend) => backend,
        }
    }
}

impl MockFacade for HttpMock {
    fn setup(&self) {
        self.backend().setup()
    }

    fn teardown(&self) {
        self.backend().teardown()
    }

    fn pass_through(&self, url: Option<UrlFilter>) {
        self.backend().pass_through(url)
    }

    fn timeout(&self, method: Method, url: UrlFilter) {
        self.backend().timeout(method, url)
    }

    fn mock_http_method(&self, method: Method, url: UrlFilter, response: ResponseSpec) {
        self.backend().mock_http_method(method, url, response)
    }

    fn received_requests(&self) -> Vec<CapturedRequest> {
        self.backend().received_requests()
    }
}

/// The backend for `environment`: [`ServerBackend`] for server processes,
/// [`BrowserBackend`] for browser-like environments.
pub fn get_http_mock(environment: Environment) -> HttpMock {
    get_http_mock_with_config(environment, MockConfig::default())
}

pub fn get_http_mock_with_config(environment: Environment, config: MockConfig) -> HttpMock {
    match environment {
        Environment::Server => HttpMock::Server(ServerBackend::with_config(config)),
        Environment::Browser => HttpMock::Browser(BrowserBackend::with_config(config)),
    }
}
