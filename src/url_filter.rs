//! Matching strategies for intercepted requests.
//!
//! A rule is a [`MatchRule`]: an optional method plus a [`UrlFilter`] applied to the full URL
//! of the request, e.g. `https://example.com/items?page=2`.
//!
//! Exact filters and captured URLs are both canonicalized with [`canonical_url`], so
//! `http://Example.com` and `http://example.com/` select the same requests on every backend.
use crate::request::normalize_method;
use crate::CapturedRequest;
use http::Method;
use regex::Regex;
use url::Url;

/// The serialization of `url` as parsed by [`Url`]: lower-case scheme and host, an explicit
/// root path. Strings that do not parse as absolute URLs are kept as they are.
pub(crate) fn canonical_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.into(),
        Err(_) => url.to_string(),
    }
}

/// Which URLs a rule applies to.
#[derive(Clone, Debug)]
pub enum UrlFilter {
    /// Match all URLs.
    Any,
    /// Match **exactly** the full URL.
    Exact(String),
    /// Match all URLs where the regex finds a match.
    Regex(Regex),
}

impl UrlFilter {
    pub fn exact<T: AsRef<str>>(url: T) -> Self {
        UrlFilter::Exact(canonical_url(url.as_ref()))
    }

    /// Compile `pattern` into a regex filter.
    ///
    /// Panics if `pattern` is not a valid regex.
    pub fn regex<T: AsRef<str>>(pattern: T) -> Self {
        UrlFilter::Regex(
            Regex::new(pattern.as_ref()).expect("Failed to create regex for url filter"),
        )
    }

    /// Canonicalize the URL of an exact filter, whichever way it was built.
    pub(crate) fn canonicalize(self) -> Self {
        match self {
            UrlFilter::Exact(url) => UrlFilter::exact(url),
            other => other,
        }
    }

    /// `url` is expected in canonical form, as found in [`CapturedRequest::url`].
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlFilter::Any => true,
            UrlFilter::Exact(expected) => expected == url,
            UrlFilter::Regex(regex) => regex.is_match(url),
        }
    }
}

impl From<&str> for UrlFilter {
    fn from(url: &str) -> Self {
        UrlFilter::exact(url)
    }
}

impl From<String> for UrlFilter {
    fn from(url: String) -> Self {
        UrlFilter::exact(url)
    }
}

impl From<&String> for UrlFilter {
    fn from(url: &String) -> Self {
        UrlFilter::exact(url.as_str())
    }
}

impl From<Regex> for UrlFilter {
    fn from(regex: Regex) -> Self {
        UrlFilter::Regex(regex)
    }
}

/// The key selecting which reply applies to an intercepted request.
#[derive(Clone, Debug)]
pub struct MatchRule {
    /// `None` matches every method.
    pub method: Option<Method>,
    pub url: UrlFilter,
}

impl MatchRule {
    /// A rule for `method` (case-insensitive) on `url`.
    ///
    /// Panics if `method` is not a valid HTTP method.
    pub fn new<M: AsRef<str>, U: Into<UrlFilter>>(method: M, url: U) -> Self {
        let method = normalize_method(method.as_ref()).expect("Failed to convert to HTTP method.");
        Self {
            method: Some(method),
            url: url.into().canonicalize(),
        }
    }

    pub fn any_method<U: Into<UrlFilter>>(url: U) -> Self {
        Self {
            method: None,
            url: url.into().canonicalize(),
        }
    }

    pub fn matches(&self, request: &CapturedRequest) -> bool {
        let method_matches = match &self.method {
            Some(method) => *method == request.method,
            None => true,
        };
        method_matches && self.url.matches(&request.url)
    }
}
