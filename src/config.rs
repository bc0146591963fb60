use crate::error::Error;
use crate::request::{BodyPrintLimit, BODY_PRINT_LIMIT};
use crate::{HyperUpstream, Upstream};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How long a timed-out request is held by backends that simulate hangs with a timer.
pub const HANG_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// The execution environment a test suite runs in: it decides which backend
/// [`get_http_mock`](crate::get_http_mock) hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// A server-side process, with a fetch-style network primitive.
    Server,
    /// A browser-like environment, with `XMLHttpRequest`.
    Browser,
}

impl Environment {
    /// Read the environment from `HTTP_INTERCEPT_ENVIRONMENT`, defaulting to [`Environment::Server`].
    pub fn from_env() -> Result<Self, Error> {
        match env::var("HTTP_INTERCEPT_ENVIRONMENT") {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::Server),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" | "node" => Ok(Environment::Server),
            "browser" => Ok(Environment::Browser),
            other => Err(Error::Configuration(format!(
                "`{}` is not a known environment, expected `server` or `browser`",
                other
            ))),
        }
    }
}

/// Settings shared by all backends, assembled step-by-step with a fluent API.
///
/// `MockConfig::default()` reads the environment:
/// - `HTTP_INTERCEPT_BODY_PRINT_LIMIT`, the number of body bytes printed for unmatched requests;
/// - `HTTP_INTERCEPT_HANG_DELAY_SECS`, how long timed-out requests are held where a timer is used.
#[derive(Clone)]
pub struct MockConfig {
    pub(crate) body_print_limit: BodyPrintLimit,
    pub(crate) hang_delay: Duration,
    pub(crate) upstream: Arc<dyn Upstream>,
    pub(crate) base_url: Url,
}

impl MockConfig {
    pub fn from_env() -> Self {
        let body_print_limit = match env::var("HTTP_INTERCEPT_BODY_PRINT_LIMIT")
            .ok()
            .and_then(|x| x.parse::<usize>().ok())
        {
            Some(limit) => BodyPrintLimit::Limited(limit),
            None => BodyPrintLimit::Limited(BODY_PRINT_LIMIT),
        };
        let hang_delay = env::var("HTTP_INTERCEPT_HANG_DELAY_SECS")
            .ok()
            .and_then(|x| x.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(HANG_DELAY);
        Self {
            body_print_limit,
            hang_delay,
            upstream: Arc::new(HyperUpstream::new()),
            base_url: Url::parse("http://localhost/").expect("Failed to parse the default base url."),
        }
    }

    /// Unmatched requests are logged with their body. By default, the size of the printed body is
    /// limited: change it if you are working with very large bodies.
    pub fn body_print_limit(mut self, limit: BodyPrintLimit) -> Self {
        self.body_print_limit = limit;
        self
    }

    /// How long the server backend holds a timed-out request before answering.
    pub fn hang_delay(mut self, delay: Duration) -> Self {
        self.hang_delay = delay;
        self
    }

    /// The real network path used for passthrough.
    pub fn upstream<U: Upstream + 'static>(mut self, upstream: U) -> Self {
        self.upstream = Arc::new(upstream);
        self
    }

    /// The document location relative `XmlHttpRequest` URLs are resolved against.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for MockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockConfig")
            .field("body_print_limit", &self.body_print_limit)
            .field("hang_delay", &self.hang_delay)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
