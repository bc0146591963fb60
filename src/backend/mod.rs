//! The three interception backends behind [`MockFacade`](crate::MockFacade).
//!
//! `server::ServerBackend` intercepts a fetch-style primitive and buffers streamed bodies,
//! `adapter::AdapterBackend` swaps the adapter of a request library, and
//! `browser::BrowserBackend` installs a process-wide `XMLHttpRequest` hook.
//!
//! All of them store rules in a [`RuleSet`](crate::rule_set::RuleSet) and build replies
//! through [`Reply`](crate::reply::Reply).
pub(crate) mod adapter;
pub(crate) mod browser;
pub(crate) mod server;

use crate::request::canonical_method;
use crate::{MatchRule, UrlFilter};
use http::Method;

pub use adapter::{AdapterBackend, AdapterBackendBuilder};
pub use browser::BrowserBackend;
pub use server::{Fetch, ServerBackend};

fn method_rule(method: Method, url: UrlFilter) -> MatchRule {
    MatchRule {
        method: Some(canonical_method(method)),
        url: url.canonicalize(),
    }
}
