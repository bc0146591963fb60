mod common;

use common::{StubUpstream, REAL_BODY};
use http::Method;
use http_intercept::xhr::XmlHttpRequest;
use http_intercept::{
    BrowserBackend, CapturedRequest, Error, MockConfig, MockFacade, MockResponse, RequestBody,
    ResponseSpec, UrlFilter,
};
use once_cell::sync::Lazy;
use serde_json::json;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

// The XMLHttpRequest hook is process-wide: tests touching it take turns.
static HOOK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

const URL: &str = "http://localhost/items";

fn backend() -> (BrowserBackend, StubUpstream) {
    let upstream = StubUpstream::default();
    let backend = BrowserBackend::with_config(MockConfig::from_env().upstream(upstream.clone()));
    (backend, upstream)
}

fn xhr(method: &str, url: &str) -> XmlHttpRequest {
    let mut xhr = XmlHttpRequest::with_upstream(StubUpstream::default());
    xhr.open(method, url);
    xhr
}

#[tokio::test]
async fn static_response_fields_default_when_omitted() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, _) = backend();
    backend.setup();
    backend.get(URL, MockResponse::new());

    // Act
    let response = xhr("GET", URL).send(None::<Vec<u8>>).await.unwrap();

    // Assert
    assert_eq!(response.status, 200);
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({}));
    assert_eq!(response.headers["content-type"], "application/json");
    backend.teardown();
}

#[tokio::test]
async fn static_response_is_returned_as_specified() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, _) = backend();
    backend.setup();
    backend.get(
        URL,
        MockResponse::with_status(418)
            .set_body_string("short and stout")
            .insert_header("x-teapot", "yes"),
    );

    // Act
    let response = xhr("GET", URL).send(None::<Vec<u8>>).await.unwrap();

    // Assert
    assert_eq!(response.status, 418);
    assert_eq!(response.response_text(), "short and stout");
    assert_eq!(response.headers["x-teapot"], "yes");
    backend.teardown();
}

#[tokio::test]
async fn relative_urls_are_resolved_against_the_base_url() {
    let _hook = HOOK.lock().await;
    // Arrange
    let backend = BrowserBackend::with_config(
        MockConfig::from_env().base_url(Url::parse("https://app.example.com/page/").unwrap()),
    );
    backend.setup();
    backend.get(
        "https://app.example.com/page/data.json",
        MockResponse::with_status(200),
    );

    // Act
    let response = xhr("GET", "data.json").send(None::<Vec<u8>>).await.unwrap();

    // Assert
    assert_eq!(response.status, 200);
    backend.teardown();
}

#[tokio::test]
async fn dynamic_response_receives_the_structured_request() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, _) = backend();
    backend.setup();
    let seen: Arc<Mutex<Option<CapturedRequest>>> = Arc::default();
    let seen_in_responder = seen.clone();
    backend.post(
        URL,
        ResponseSpec::dynamic(move |request: CapturedRequest| {
            let seen = seen_in_responder.clone();
            async move {
                *seen.lock().unwrap() = Some(request);
                Ok::<_, Infallible>(MockResponse::with_status(201))
            }
        }),
    );
    let mut request = xhr("post", URL);
    request.set_request_header("Content-Type", "text/plain");

    // Act
    let response = request.send(Some("hello")).await.unwrap();

    // Assert
    assert_eq!(response.status, 201);
    let seen = seen.lock().unwrap().take().unwrap();
    assert_eq!(seen.url, URL);
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.headers["Content-Type"], "text/plain");
    assert_eq!(seen.body, RequestBody::Raw("hello".into()));
    backend.teardown();
}

#[tokio::test]
async fn a_failing_response_function_fails_the_request() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, _) = backend();
    backend.setup();
    backend.get(
        URL,
        ResponseSpec::dynamic(|_request: CapturedRequest| async {
            Err::<MockResponse, _>("mocked failure")
        }),
    );

    // Act
    let outcome = xhr("GET", URL).send(None::<Vec<u8>>).await;

    // Assert
    assert!(matches!(outcome, Err(Error::Responder(_))));
    backend.teardown();
}

#[tokio::test]
async fn unmatched_requests_fail() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, upstream) = backend();
    backend.setup();

    // Act
    let outcome = xhr("DELETE", URL).send(None::<Vec<u8>>).await;

    // Assert
    assert!(matches!(outcome, Err(Error::Unmatched { method, .. }) if method == Method::DELETE));
    assert_eq!(upstream.hits(), 0);
    backend.teardown();
}

#[tokio::test]
async fn teardown_removes_the_hook() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, backend_upstream) = backend();
    backend.setup();
    backend.get(URL, MockResponse::with_status(201));
    let own_upstream = StubUpstream::default();
    let mut request = XmlHttpRequest::with_upstream(own_upstream.clone());
    request.open("GET", URL);

    // Act
    backend.teardown();
    let response = request.send(None::<Vec<u8>>).await.unwrap();

    // Assert - the request used its own network path
    assert_eq!(response.status, 299);
    assert_eq!(own_upstream.hits(), 1);
    assert_eq!(backend_upstream.hits(), 0);
}

#[tokio::test]
async fn teardown_then_setup_forgets_rules_and_history() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, _) = backend();
    backend.setup();
    backend.get(URL, MockResponse::new());
    xhr("GET", URL).send(None::<Vec<u8>>).await.unwrap();

    // Act
    backend.teardown();
    backend.setup();
    let outcome = xhr("GET", URL).send(None::<Vec<u8>>).await;

    // Assert
    assert!(matches!(outcome, Err(Error::Unmatched { .. })));
    assert_eq!(backend.received_requests().len(), 1);
    backend.teardown();
}

#[tokio::test]
async fn teardown_is_safe_without_setup() {
    let _hook = HOOK.lock().await;
    let (backend, _) = backend();

    backend.teardown();
}

#[tokio::test]
async fn filtered_pass_through_degrades_to_passing_everything_through() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, upstream) = backend();
    backend.setup();
    backend.get(URL, MockResponse::with_status(201));
    backend.pass_through(Some(UrlFilter::exact("http://localhost/health")));

    // Act
    let response = xhr("GET", URL).send(None::<Vec<u8>>).await.unwrap();

    // Assert
    assert_eq!(response.status, 299);
    assert_eq!(response.response_text(), REAL_BODY);
    assert_eq!(upstream.hits(), 1);
    backend.teardown();
}

#[tokio::test]
async fn timed_out_requests_do_not_resolve() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (backend, _) = backend();
    backend.setup();
    backend.timeout(Method::GET, URL.into());

    // Act
    let outcome = tokio::time::timeout(
        Duration::from_millis(200),
        xhr("GET", URL).send(None::<Vec<u8>>),
    )
    .await;

    // Assert
    assert!(outcome.is_err());
    backend.teardown();
}

#[tokio::test]
async fn setting_up_a_second_backend_replaces_the_first() {
    let _hook = HOOK.lock().await;
    // Arrange
    let (first, _) = backend();
    let (second, _) = backend();
    first.setup();
    first.get(URL, MockResponse::with_status(201));
    second.setup();
    second.get(URL, MockResponse::with_status(202));

    // Act
    let response = xhr("GET", URL).send(None::<Vec<u8>>).await.unwrap();

    // Assert
    assert_eq!(response.status, 202);
    assert!(first.received_requests().is_empty());

    // Tearing down the replaced backend leaves the active hook alone
    first.teardown();
    let response = xhr("GET", URL).send(None::<Vec<u8>>).await.unwrap();
    assert_eq!(response.status, 202);
    second.teardown();
}

#[tokio::test]
async fn send_without_open_is_an_error() {
    let request = XmlHttpRequest::with_upstream(StubUpstream::default());

    let outcome = request.send(None::<Vec<u8>>).await;

    assert!(matches!(outcome, Err(Error::Configuration(_))));
}
