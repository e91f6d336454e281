use std::fmt;
use std::thread;
use std::time::Duration;

use chrono::Utc;

use super::http::{HttpHeader, HttpRequest, MAX_RESPONSE_LENGTH, Method, Transport};
use super::platform::user_agent;
use crate::core::{CorrelationVector, is_retriable_status, parse_retry_after, retry_delay, status_to_error};
use crate::data::ConnectionConfig;
use crate::error::{Result, sfs_ensure, sfs_raise};
use crate::reporting::{ReportingHandler, log_info, log_verbose, log_warning};

/// A channel to the service with retries and request correlation.
///
/// Not meant to be shared: each thread should make its own through a
/// [`ConnectionManager`](super::ConnectionManager).
pub struct Connection {
    transport: Box<dyn Transport>,
    cv: CorrelationVector,
    max_retries: u32,
    base_retry_delay: Duration,
    handler: ReportingHandler,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &"{ ... }")
            .field("cv", &self.cv)
            .field("max_retries", &self.max_retries)
            .field("base_retry_delay", &self.base_retry_delay)
            .finish()
    }
}

impl Connection {
    /// Wrap `transport`. Fails `InvalidArg` if the configured base correlation
    /// vector is malformed.
    pub fn new(
        transport: Box<dyn Transport>,
        config: &ConnectionConfig,
        handler: ReportingHandler,
    ) -> Result<Self> {
        let cv = match config.base_cv.as_deref() {
            Some(base) => match CorrelationVector::with_base(base) {
                Ok(cv) => cv,
                Err(err) => sfs_raise!(handler, err),
            },
            None => CorrelationVector::new(),
        };

        Ok(Self {
            transport,
            cv,
            max_retries: config.max_retries,
            base_retry_delay: config.base_retry_delay,
            handler,
        })
    }

    /// Send a GET and return the body of the 200 response.
    pub fn get(&mut self, url: &str) -> Result<String> {
        self.execute(Method::Get, url, "")
    }

    /// Send a POST with a JSON `body`, which may be empty, and return the body
    /// of the 200 response.
    pub fn post(&mut self, url: &str, body: &str) -> Result<String> {
        self.execute(Method::Post, url, body)
    }

    pub fn correlation_vector(&self) -> &CorrelationVector {
        &self.cv
    }

    fn execute(&mut self, method: Method, url: &str, body: &str) -> Result<String> {
        sfs_ensure!(!url.is_empty(), self.handler, InvalidArg, "url cannot be empty");

        // One value per call, shared by all of its attempts.
        let cv = self.cv.increment_and_get();

        let mut headers = Vec::with_capacity(3);
        if method == Method::Post {
            headers.push((HttpHeader::ContentType, "application/json".to_string()));
        }
        headers.push((HttpHeader::MsCv, cv.clone()));
        headers.push((HttpHeader::UserAgent, user_agent().to_string()));

        let request = HttpRequest {
            method,
            url,
            headers: &headers,
            body,
            max_response_len: MAX_RESPONSE_LENGTH,
        };

        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            log_info!(self.handler, "Request attempt {attempt} out of {attempts} (cv: {cv})");
            log_verbose!(self.handler, "{method} {url}");

            let response = match self.transport.execute(&request) {
                Ok(response) => response,
                Err(err) => sfs_raise!(self.handler, err.into()),
            };

            if response.status == 200 {
                return Ok(response.body);
            }

            let err = status_to_error(response.status);
            if attempt >= attempts || !is_retriable_status(response.status) {
                sfs_raise!(self.handler, err);
            }
            log_warning!(self.handler, "Attempt {attempt} failed: {err}");

            let delay = match response.header(HttpHeader::RetryAfter) {
                Some(value) => match parse_retry_after(value, Utc::now()) {
                    Ok(delay) => delay,
                    Err(err) => sfs_raise!(self.handler, err.into()),
                },
                None => retry_delay(attempt, self.base_retry_delay),
            };

            log_info!(self.handler, "Sleeping for {} ms", delay.as_millis());
            thread::sleep(delay);

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::http::{HttpResponse, TransportError};
    use crate::error::ErrorCode;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Sent = Arc<Mutex<Vec<(Method, String, Vec<(HttpHeader, String)>, String)>>>;

    /// Replays canned outcomes and records what was sent.
    struct Scripted {
        outcomes: VecDeque<std::result::Result<HttpResponse, TransportError>>,
        sent: Sent,
    }

    impl Transport for Scripted {
        fn execute(
            &mut self,
            request: &HttpRequest<'_>,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push((
                request.method,
                request.url.to_string(),
                request.headers.to_vec(),
                request.body.to_string(),
            ));
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "")))
        }
    }

    fn connection(
        outcomes: Vec<std::result::Result<HttpResponse, TransportError>>,
        config: ConnectionConfig,
    ) -> (Connection, Sent) {
        let sent = Sent::default();
        let transport = Scripted {
            outcomes: outcomes.into(),
            sent: Arc::clone(&sent),
        };
        let config = config.base_retry_delay(Duration::ZERO);
        let conn = Connection::new(Box::new(transport), &config, ReportingHandler::new()).unwrap();
        (conn, sent)
    }

    fn header(headers: &[(HttpHeader, String)], name: HttpHeader) -> Option<&str> {
        headers.iter().find(|(h, _)| *h == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn returns_body_of_success() {
        let (mut conn, sent) = connection(vec![Ok(HttpResponse::new(200, "ok"))], ConnectionConfig::default());
        assert_eq!(conn.get("http://host/").unwrap(), "ok");
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn empty_url_is_invalid() {
        let (mut conn, sent) = connection(vec![], ConnectionConfig::default());
        assert_eq!(conn.get("").unwrap_err().code(), ErrorCode::InvalidArg);
        assert_eq!(conn.post("", "{}").unwrap_err().message(), "url cannot be empty");
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn post_sends_json_headers() {
        let (mut conn, sent) = connection(vec![], ConnectionConfig::default());
        conn.post("http://host/", "{\"a\":1}").unwrap();
        conn.get("http://host/").unwrap();

        let sent = sent.lock().unwrap();
        let (method, _, headers, body) = &sent[0];
        assert_eq!(*method, Method::Post);
        assert_eq!(body, "{\"a\":1}");
        assert_eq!(header(headers, HttpHeader::ContentType), Some("application/json"));
        assert_eq!(header(headers, HttpHeader::UserAgent), Some(user_agent()));

        let (method, _, headers, _) = &sent[1];
        assert_eq!(*method, Method::Get);
        assert_eq!(header(headers, HttpHeader::ContentType), None);
    }

    #[test]
    fn cv_is_shared_by_retries_and_incremented_per_call() {
        let base = "aaaaaaaaaaaaaaaaaaaaaA";
        let (mut conn, sent) = connection(
            vec![Ok(HttpResponse::new(503, "")), Ok(HttpResponse::new(200, ""))],
            ConnectionConfig::default().base_cv(base),
        );
        conn.get("http://host/").unwrap();
        conn.get("http://host/").unwrap();

        let cvs: Vec<String> = sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, headers, _)| header(headers, HttpHeader::MsCv).unwrap().to_string())
            .collect();
        assert_eq!(cvs, vec![format!("{base}.0"), format!("{base}.0"), format!("{base}.1")]);
    }

    #[test]
    fn invalid_base_cv_fails() {
        let config = ConnectionConfig::default().base_cv("not a cv");
        let err = Connection::new(
            Box::new(Scripted {
                outcomes: VecDeque::new(),
                sent: Sent::default(),
            }),
            &config,
            ReportingHandler::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArg);
    }

    #[test]
    fn retries_until_budget_is_spent() {
        let (mut conn, sent) = connection(
            vec![
                Ok(HttpResponse::new(500, "")),
                Ok(HttpResponse::new(502, "")),
                Ok(HttpResponse::new(504, "")),
                Ok(HttpResponse::new(429, "")),
                Ok(HttpResponse::new(200, "")),
            ],
            ConnectionConfig::default(),
        );
        let err = conn.get("http://host/").unwrap_err();
        assert_eq!(err.code(), ErrorCode::HttpTooManyRequests);
        assert_eq!(sent.lock().unwrap().len(), 4);
    }

    #[test]
    fn no_retries_when_disabled() {
        let (mut conn, sent) = connection(
            vec![Ok(HttpResponse::new(503, ""))],
            ConnectionConfig::default().max_retries(0),
        );
        assert_eq!(conn.get("http://host/").unwrap_err().code(), ErrorCode::HttpServiceNotAvailable);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn non_retriable_status_fails_immediately() {
        for (status, code) in [
            (400, ErrorCode::HttpBadRequest),
            (404, ErrorCode::HttpNotFound),
            (405, ErrorCode::HttpMethodNotAllowed),
            (501, ErrorCode::HttpUnexpected),
        ] {
            let (mut conn, sent) =
                connection(vec![Ok(HttpResponse::new(status, ""))], ConnectionConfig::default());
            assert_eq!(conn.get("http://host/").unwrap_err().code(), code);
            assert_eq!(sent.lock().unwrap().len(), 1);
        }
    }

    #[test]
    fn transport_failures_are_not_retried() {
        let (mut conn, sent) = connection(vec![Err(TransportError::Timeout)], ConnectionConfig::default());
        assert_eq!(conn.get("http://host/").unwrap_err().code(), ErrorCode::HttpTimeout);
        assert_eq!(sent.lock().unwrap().len(), 1);

        let (mut conn, _) = connection(
            vec![Err(TransportError::ResponseTooLarge { limit: MAX_RESPONSE_LENGTH })],
            ConnectionConfig::default(),
        );
        assert_eq!(
            conn.get("http://host/").unwrap_err().code(),
            ErrorCode::ConnectionUnexpectedError
        );
    }

    #[test]
    fn invalid_retry_after_is_fatal() {
        for value in ["0", "-1", "later"] {
            let (mut conn, sent) = connection(
                vec![Ok(HttpResponse::new(503, "").with_header("Retry-After", value))],
                ConnectionConfig::default(),
            );
            let err = conn.get("http://host/").unwrap_err();
            assert_eq!(err.code(), ErrorCode::ConnectionUnexpectedError, "{value}");
            assert_eq!(sent.lock().unwrap().len(), 1);
        }
    }
}
