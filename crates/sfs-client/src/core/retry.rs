//! Retry policy of a connection: backoff, retriable statuses, status mapping
//! and `Retry-After` interpretation.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::error::{Error, ErrorCode};

/// HTTP statuses worth another attempt.
pub const RETRIABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Backoff before the attempt after `attempt` (1-based): `base * 2^(attempt - 1)`.
///
/// Only used when the failed response carried no `Retry-After`.
pub fn retry_delay(attempt: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(multiplier)
}

pub fn is_retriable_status(status: u16) -> bool {
    RETRIABLE_STATUSES.contains(&status)
}

/// Map a non-200 status to the failure reported to the caller.
///
/// Statuses outside the fixed table are all `HttpUnexpected`.
pub fn status_to_error(status: u16) -> Error {
    match status {
        400 => Error::new(ErrorCode::HttpBadRequest, "400 Bad Request"),
        404 => Error::new(ErrorCode::HttpNotFound, "404 Not Found"),
        405 => Error::new(ErrorCode::HttpMethodNotAllowed, "405 Method Not Allowed"),
        429 => Error::new(ErrorCode::HttpTooManyRequests, "429 Too Many Requests"),
        503 => Error::new(ErrorCode::HttpServiceNotAvailable, "503 Service Unavailable"),
        other => Error::new(ErrorCode::HttpUnexpected, format!("Unexpected HTTP code {other}")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryAfterError {
    #[error("Retry-After header value could not be converted to an integer or an HTTP Date")]
    Unparsable(String),

    #[error("Retry-After header value is not in the expected range")]
    OutOfRange(i64),
}

impl From<RetryAfterError> for Error {
    fn from(err: RetryAfterError) -> Self {
        Error::new(ErrorCode::ConnectionUnexpectedError, err.to_string())
    }
}

// RFC 850 and asctime, the obsolete forms HTTP/1.1 still requires recipients to accept.
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Interpret a `Retry-After` value as the time to wait.
///
/// The value is either a number of seconds or an HTTP date, which is turned
/// into the number of whole seconds from `now`. Anything that does not resolve
/// to a positive wait is an error.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Result<Duration, RetryAfterError> {
    let value = value.trim();

    let seconds = match value.parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => {
            let date = parse_http_date(value)
                .ok_or_else(|| RetryAfterError::Unparsable(value.to_string()))?;
            (date - now).num_seconds()
        }
    };

    if seconds <= 0 {
        return Err(RetryAfterError::OutOfRange(seconds));
    }
    Ok(Duration::from_secs(seconds.unsigned_abs()))
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    [RFC850_FORMAT, ASCTIME_FORMAT]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
