use crate::error::DynError;
use crate::{CapturedRequest, MockResponse};
use async_trait::async_trait;
use std::future::Future;

/// Anything that implements `Respond` can compute the reply to an intercepted request.
///
/// Async closures taking a [`CapturedRequest`] and returning a `Result<MockResponse, E>`
/// implement `Respond` out of the box:
///
/// ```rust
/// use http_intercept::{CapturedRequest, MockResponse, ResponseSpec};
///
/// let echo = ResponseSpec::dynamic(|request: CapturedRequest| async move {
///     Ok::<_, std::io::Error>(
///         MockResponse::with_status(200).insert_header("x-echo-method", request.method.as_str()),
///     )
/// });
/// ```
///
/// The request is always fully materialized: backends drain streamed bodies before calling
/// `respond`. An error returned from `respond` fails the intercepted request with
/// [`Error::Responder`](crate::Error::Responder).
#[async_trait]
pub trait Respond: Send + Sync {
    async fn respond(&self, request: CapturedRequest) -> Result<MockResponse, DynError>;
}

#[async_trait]
impl<F, Fut, E> Respond for F
where
    F: Fn(CapturedRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<MockResponse, E>> + Send + 'static,
    E: Into<DynError> + 'static,
{
    async fn respond(&self, request: CapturedRequest) -> Result<MockResponse, DynError> {
        self(request).await.map_err(Into::into)
    }
}
