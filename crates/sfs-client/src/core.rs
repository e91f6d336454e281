//! Pure logic: no network access, no sleeping.

pub mod cv;
pub mod entity;
pub mod retry;
pub mod service_url;
pub mod url;

pub use cv::{CorrelationVector, CorrelationVectorError};
pub use entity::{ContentType, FileEntity, VersionEntity};
pub use retry::{
    RETRIABLE_STATUSES, RetryAfterError, is_retriable_status, parse_retry_after, retry_delay,
    status_to_error,
};
pub use service_url::{BaseUrl, ServiceUrlBuilder};
pub use self::url::{Scheme, UrlBuilder};
