use http::{HeaderMap, Method, StatusCode};
use http_intercept::{
    CapturedRequest, Error, HttpResponse, InMemoryResponse, RequestBody,
};
use serde_json::json;

fn request() -> CapturedRequest {
    CapturedRequest {
        url: "https://example.com/cached".to_string(),
        method: Method::GET,
        headers: Default::default(),
        body: RequestBody::Empty,
    }
}

#[test]
fn views_are_derived_from_the_body_text() {
    // Arrange
    let response =
        InMemoryResponse::new(request(), StatusCode::OK, HeaderMap::new()).body_text(r#"{"a":1}"#);

    // Assert
    assert_eq!(response.text_body(), Some(r#"{"a":1}"#));
    assert_eq!(response.parsed_body().unwrap(), Some(json!({ "a": 1 })));
    assert_eq!(&response.blob_body()[..], br#"{"a":1}"#);
    assert!(response.deserialized_body().is_none());
}

#[test]
fn no_body_text_means_absent_text_and_json_but_an_empty_blob() {
    // Arrange
    let response = InMemoryResponse::new(request(), StatusCode::NO_CONTENT, HeaderMap::new());

    // Assert
    assert_eq!(response.text_body(), None);
    assert_eq!(response.parsed_body().unwrap(), None);
    assert!(response.blob_body().is_empty());
}

#[test]
fn invalid_json_text_is_a_parse_error() {
    // Arrange
    let response =
        InMemoryResponse::new(request(), StatusCode::OK, HeaderMap::new()).body_text("not json");

    // Assert
    assert!(matches!(response.parsed_body(), Err(Error::Parse(_))));
    // The other views are unaffected
    assert_eq!(response.text_body(), Some("not json"));
    assert_eq!(&response.blob_body()[..], b"not json");
}

#[test]
fn the_deserialized_body_is_independent_of_the_text() {
    // Arrange
    let response = InMemoryResponse::new(request(), StatusCode::OK, HeaderMap::new())
        .deserialized(json!({ "decoded": true }));

    // Assert
    assert_eq!(response.deserialized_body(), Some(&json!({ "decoded": true })));
    assert_eq!(response.parsed_body().unwrap(), None);
    assert_eq!(response.text_body(), None);
}

#[test]
fn streaming_the_body_is_unsupported() {
    // Arrange
    let response =
        InMemoryResponse::new(request(), StatusCode::OK, HeaderMap::new()).body_text("streamed?");

    // Assert
    assert!(matches!(
        response.readable_stream_body(),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn status_headers_and_request_are_kept() {
    // Arrange
    let headers = [("x-cache".to_string(), "hit".to_string())]
        .into_iter()
        .collect();

    // Act
    let response =
        InMemoryResponse::with_raw_headers(request(), StatusCode::ACCEPTED, &headers).unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-cache"], "hit");
    assert_eq!(response.request().url, "https://example.com/cached");
}

#[test]
fn invalid_raw_headers_are_rejected() {
    let headers = [("bad header".to_string(), "value".to_string())]
        .into_iter()
        .collect();

    let outcome = InMemoryResponse::with_raw_headers(request(), StatusCode::OK, &headers);

    assert!(matches!(outcome, Err(Error::InvalidHeader(_))));
}
