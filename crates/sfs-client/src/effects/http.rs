use std::fmt;

use thiserror::Error;

use crate::error::{Error, ErrorCode};

/// Largest response body accepted from the service.
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Headers the client sends or reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpHeader {
    ContentType,
    MsCv,
    UserAgent,
    RetryAfter,
}

impl HttpHeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpHeader::ContentType => "Content-Type",
            HttpHeader::MsCv => "MS-CV",
            HttpHeader::UserAgent => "User-Agent",
            HttpHeader::RetryAfter => "Retry-After",
        }
    }
}

impl fmt::Display for HttpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request handed to a [`Transport`].
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    pub headers: &'a [(HttpHeader, String)],
    /// Ignored for GET.
    pub body: &'a str,
    /// A body longer than this aborts the transfer.
    pub max_response_len: usize,
}

/// A completed exchange, whatever its status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header. Names compare case-insensitively.
    pub fn header(&self, header: HttpHeader) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header.as_str()))
            .map(|(_, value)| value.as_str())
    }
}

/// Failures below HTTP: nothing usable came back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Failed to set up the transport: {0}")]
    Setup(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Response body exceeded the limit of {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Out of memory while reading the response")]
    OutOfMemory,

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        let code = match &err {
            TransportError::Setup(_) => ErrorCode::ConnectionSetupFailed,
            TransportError::Timeout => ErrorCode::HttpTimeout,
            TransportError::OutOfMemory => ErrorCode::OutOfMemory,
            TransportError::ResponseTooLarge { .. } | TransportError::Other(_) => {
                ErrorCode::ConnectionUnexpectedError
            }
        };
        Error::new(code, err.to_string())
    }
}

/// Blocking HTTP transport.
///
/// The only seam between the client and the network. Implementations send
/// exactly one request per call and never retry.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: Production implementation using `reqwest`
/// - In-memory services for testing
pub trait Transport: Send {
    fn execute(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::io::{self, Read};

    use super::*;

    /// Production transport using `reqwest`'s blocking client.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::blocking::Client,
    }

    impl ReqwestTransport {
        /// Create a transport, optionally sending everything through `proxy`.
        pub fn new(proxy: Option<&str>) -> Result<Self, TransportError> {
            // A 3xx is reported to the caller like any other unexpected status.
            let mut builder = reqwest::blocking::Client::builder().redirect(reqwest::redirect::Policy::none());
            if let Some(proxy) = proxy {
                let proxy = reqwest::Proxy::all(proxy)
                    .map_err(|err| TransportError::Setup(format!("invalid proxy \"{proxy}\": {err}")))?;
                builder = builder.proxy(proxy);
            }

            let client = builder
                .build()
                .map_err(|err| TransportError::Setup(err.to_string()))?;
            Ok(Self { client })
        }
    }

    impl Transport for ReqwestTransport {
        fn execute(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
            let mut builder = match request.method {
                Method::Get => self.client.get(request.url),
                Method::Post => self.client.post(request.url).body(request.body.to_string()),
            };
            for (header, value) in request.headers {
                builder = builder.header(header.as_str(), value);
            }

            let response = builder.send().map_err(map_reqwest_error)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();

            let limit = request.max_response_len;
            let mut body = Vec::new();
            if let Some(len) = response.content_length() {
                let len = usize::try_from(len).unwrap_or(usize::MAX);
                if len > limit {
                    return Err(TransportError::ResponseTooLarge { limit });
                }
                body.try_reserve(len)
                    .map_err(|_| TransportError::OutOfMemory)?;
            }

            // One byte past the limit is enough to tell an oversized body apart.
            let read_limit = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
            response
                .take(read_limit)
                .read_to_end(&mut body)
                .map_err(map_io_error)?;
            if body.len() > limit {
                return Err(TransportError::ResponseTooLarge { limit });
            }

            Ok(HttpResponse {
                status,
                headers,
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }

    fn map_reqwest_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Other(err.to_string())
        }
    }

    fn map_io_error(err: io::Error) -> TransportError {
        match err.kind() {
            io::ErrorKind::TimedOut => TransportError::Timeout,
            io::ErrorKind::OutOfMemory => TransportError::OutOfMemory,
            _ => TransportError::Other(err.to_string()),
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
