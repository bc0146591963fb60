//! Convenient re-exports of http types that are part of `http_intercept`'s public API.
pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
pub use hyper::body::Bytes;
pub use url::Url;
