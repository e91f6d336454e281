use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::reporting::LoggingCallback;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay of the exponential backoff, as recommended by the service.
pub const DEFAULT_BASE_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Client-wide configuration.
///
/// `instance_id` and `name_space` default to `"default"` when unset.
#[derive(Default)]
pub struct ClientConfig {
    /// Account of the caller. Required.
    pub account_id: String,

    pub instance_id: Option<String>,

    pub name_space: Option<String>,

    /// Receives every log record of the client.
    pub log_callback: Option<LoggingCallback>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("account_id", &self.account_id)
            .field("instance_id", &self.instance_id)
            .field("name_space", &self.name_space)
            .field("log_callback", &self.log_callback.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl ClientConfig {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    #[must_use]
    pub fn name_space(mut self, name_space: impl Into<String>) -> Self {
        self.name_space = Some(name_space.into());
        self
    }

    #[must_use]
    pub fn log_callback(mut self, callback: LoggingCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }
}

/// A product to resolve and the targeting attributes sent along.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRequest {
    pub product: String,
    pub attributes: HashMap<String, String>,
}

impl ProductRequest {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Per-call request parameters.
///
/// # Examples
///
/// ```
/// use sfs_client::{ProductRequest, RequestParams};
///
/// let params = RequestParams::new(ProductRequest::new("msedge-stable-win-x64"))
///     .base_cv("aaaaaaaaaaaaaaaaaaaaaA.1")
///     .retry_on_error(false);
/// assert_eq!(params.product_requests.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    /// Only a single request is currently supported by the download-info calls.
    pub product_requests: Vec<ProductRequest>,

    /// Correlation vector to extend instead of generating a new one.
    pub base_cv: Option<String>,

    /// Proxy through which requests are sent.
    pub proxy: Option<String>,

    /// Whether retriable HTTP failures are retried.
    ///
    /// Default: true
    pub retry_on_error: bool,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            product_requests: Vec::new(),
            base_cv: None,
            proxy: None,
            retry_on_error: true,
        }
    }
}

impl RequestParams {
    pub fn new(request: ProductRequest) -> Self {
        Self {
            product_requests: vec![request],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn base_cv(mut self, base_cv: impl Into<String>) -> Self {
        self.base_cv = Some(base_cv.into());
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn retry_on_error(mut self, retry_on_error: bool) -> Self {
        self.retry_on_error = retry_on_error;
        self
    }
}

/// Settings of a single connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Retries after the first attempt. Total attempts = 1 + max_retries.
    ///
    /// Default: 3
    pub max_retries: u32,

    pub base_cv: Option<String>,

    pub proxy: Option<String>,

    /// Base of the exponential backoff. The delay before retry N is
    /// `base_retry_delay * 2^(N-1)`.
    ///
    /// Default: 15s
    pub base_retry_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_cv: None,
            proxy: None,
            base_retry_delay: DEFAULT_BASE_RETRY_DELAY,
        }
    }
}

impl From<&RequestParams> for ConnectionConfig {
    fn from(params: &RequestParams) -> Self {
        Self {
            max_retries: if params.retry_on_error { DEFAULT_MAX_RETRIES } else { 0 },
            base_cv: params.base_cv.clone(),
            proxy: params.proxy.clone(),
            ..Self::default()
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn base_cv(mut self, base_cv: impl Into<String>) -> Self {
        self.base_cv = Some(base_cv.into());
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn base_retry_delay(mut self, base_retry_delay: Duration) -> Self {
        self.base_retry_delay = base_retry_delay;
        self
    }
}
