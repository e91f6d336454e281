mod common;

use std::time::{Duration, Instant};

use chrono::Utc;
use common::{MOCK_URL, MockService};
use sfs_client::effects::{HttpHeader, HttpResponse, Method, TransportError};
use sfs_client::{Connection, ConnectionConfig, ErrorCode, ReportingHandler};

const BASE_CV: &str = "aaaaaaaaaaaaaaaaaaaaaA";

fn connect(service: &MockService, config: ConnectionConfig) -> Connection {
    Connection::new(Box::new(service.clone()), &config, ReportingHandler::new()).unwrap()
}

fn fast() -> ConnectionConfig {
    ConnectionConfig::default().base_retry_delay(Duration::from_millis(1))
}

#[test]
fn backoff_doubles_between_attempts() {
    let service = MockService::new();
    service.queue_status(503, 3);
    service.queue(HttpResponse::new(200, "done"));

    let base = Duration::from_millis(20);
    let mut conn = connect(&service, ConnectionConfig::default().base_retry_delay(base));

    let start = Instant::now();
    assert_eq!(conn.get(MOCK_URL).unwrap(), "done");
    // 20 + 40 + 80
    assert!(start.elapsed() >= Duration::from_millis(140));
    assert_eq!(service.requests().len(), 4);
}

#[test]
fn exhausted_retries_report_the_last_status() {
    let service = MockService::new();
    service.queue_status(503, 3);
    service.queue_status(500, 1);
    service.queue(HttpResponse::new(200, ""));

    let mut conn = connect(&service, fast());
    let err = conn.get(MOCK_URL).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HttpUnexpected);
    assert_eq!(err.message(), "Unexpected HTTP code 500");
    assert_eq!(service.requests().len(), 4);
}

#[test]
fn retry_after_seconds_override_the_backoff() {
    let service = MockService::new();
    service.queue(HttpResponse::new(429, "").with_header("retry-after", "1"));
    service.queue(HttpResponse::new(200, ""));

    let mut conn = connect(
        &service,
        ConnectionConfig::default().base_retry_delay(Duration::from_secs(30)),
    );

    let start = Instant::now();
    conn.get(MOCK_URL).unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(10));
}

#[test]
fn retry_after_date_overrides_the_backoff() {
    let at = Utc::now() + chrono::Duration::seconds(2);
    let service = MockService::new();
    service.queue(
        HttpResponse::new(503, "").with_header("Retry-After", at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
    );
    service.queue(HttpResponse::new(200, ""));

    let mut conn = connect(
        &service,
        ConnectionConfig::default().base_retry_delay(Duration::from_secs(30)),
    );

    let start = Instant::now();
    conn.get(MOCK_URL).unwrap();
    let elapsed = start.elapsed();
    // The header has second precision.
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(10));
}

#[test]
fn retry_after_in_the_past_fails() {
    let at = Utc::now() - chrono::Duration::seconds(60);
    let service = MockService::new();
    service.queue(
        HttpResponse::new(503, "").with_header("Retry-After", at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
    );

    let mut conn = connect(&service, fast());
    let err = conn.get(MOCK_URL).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConnectionUnexpectedError);
    assert_eq!(service.requests().len(), 1);
}

#[test]
fn status_codes_map_to_error_codes() {
    let cases = [
        (400, ErrorCode::HttpBadRequest),
        (404, ErrorCode::HttpNotFound),
        (405, ErrorCode::HttpMethodNotAllowed),
        (429, ErrorCode::HttpTooManyRequests),
        (503, ErrorCode::HttpServiceNotAvailable),
        (500, ErrorCode::HttpUnexpected),
        (502, ErrorCode::HttpUnexpected),
        (504, ErrorCode::HttpUnexpected),
        (302, ErrorCode::HttpUnexpected),
    ];

    for (status, code) in cases {
        let service = MockService::new();
        service.queue_status(status, 1);
        let mut conn = connect(&service, fast().max_retries(0));
        assert_eq!(conn.get(MOCK_URL).unwrap_err().code(), code, "status {status}");
    }
}

#[test]
fn correlation_vector_extends_the_base_per_call() {
    let service = MockService::new();
    service.queue_status(500, 1);
    service.queue_status(200, 3);
    let mut conn = connect(&service, fast().base_cv(BASE_CV));

    conn.get(MOCK_URL).unwrap();
    conn.post(MOCK_URL, "").unwrap();
    conn.get(MOCK_URL).unwrap();

    let cvs: Vec<String> = service
        .requests()
        .iter()
        .map(|request| request.header(HttpHeader::MsCv).unwrap().to_string())
        .collect();
    assert_eq!(
        cvs,
        vec![
            format!("{BASE_CV}.0"),
            format!("{BASE_CV}.0"),
            format!("{BASE_CV}.1"),
            format!("{BASE_CV}.2"),
        ]
    );
}

#[test]
fn generated_correlation_vector_starts_at_zero() {
    let service = MockService::new();
    service.queue_status(200, 1);
    let mut conn = connect(&service, fast());
    conn.get(MOCK_URL).unwrap();

    let requests = service.requests();
    let cv = requests[0].header(HttpHeader::MsCv).unwrap();
    assert!(cv.ends_with(".0"), "{cv}");
}

#[test]
fn post_carries_json_content_type() {
    let service = MockService::new();
    service.queue_status(200, 1);
    let mut conn = connect(&service, fast());
    conn.post(MOCK_URL, "{}").unwrap();

    let requests = service.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].body, "{}");
    assert_eq!(requests[0].header(HttpHeader::ContentType), Some("application/json"));
    assert!(requests[0].header(HttpHeader::UserAgent).is_some());
}

#[test]
fn transport_timeout_is_reported() {
    let service = MockService::new();
    service.queue_failure(TransportError::Timeout);

    let mut conn = connect(&service, fast());
    assert_eq!(conn.get(MOCK_URL).unwrap_err().code(), ErrorCode::HttpTimeout);
    assert_eq!(service.requests().len(), 1);
}

#[test]
fn transport_setup_failure_is_reported() {
    let service = MockService::new();
    service.queue_failure(TransportError::Setup("bad proxy".into()));

    let mut conn = connect(&service, fast());
    assert_eq!(
        conn.get(MOCK_URL).unwrap_err().code(),
        ErrorCode::ConnectionSetupFailed
    );
}
