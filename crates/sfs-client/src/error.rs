//! Error types for sfs-client.
//!
//! Every failure is an [`Error`] carrying an [`ErrorCode`] from a closed
//! taxonomy plus a human readable message. Codes are grouped by numeric range
//! so callers can tell generic, connection, HTTP and service failures apart.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    // Generic
    InvalidArg = 0x8000_0001,
    NotImpl = 0x8000_0002,
    NotSet = 0x8000_0003,
    OutOfMemory = 0x8000_0004,
    Unexpected = 0x8000_0005,

    // Connection
    ConnectionSetupFailed = 0x8000_0101,
    ConnectionUnexpectedError = 0x8000_0102,
    ConnectionUrlSetupFailed = 0x8000_0103,

    // HTTP
    HttpBadRequest = 0x8000_0201,
    HttpNotFound = 0x8000_0202,
    HttpMethodNotAllowed = 0x8000_0203,
    HttpServiceNotAvailable = 0x8000_0204,
    HttpTimeout = 0x8000_0205,
    HttpTooManyRequests = 0x8000_0206,
    HttpUnexpected = 0x8000_0207,

    // Service
    ServiceInvalidResponse = 0x8000_0301,
    ServiceUnexpectedContentType = 0x8000_0302,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArg => "InvalidArg",
            ErrorCode::NotImpl => "NotImpl",
            ErrorCode::NotSet => "NotSet",
            ErrorCode::OutOfMemory => "OutOfMemory",
            ErrorCode::Unexpected => "Unexpected",
            ErrorCode::ConnectionSetupFailed => "ConnectionSetupFailed",
            ErrorCode::ConnectionUnexpectedError => "ConnectionUnexpectedError",
            ErrorCode::ConnectionUrlSetupFailed => "ConnectionUrlSetupFailed",
            ErrorCode::HttpBadRequest => "HttpBadRequest",
            ErrorCode::HttpNotFound => "HttpNotFound",
            ErrorCode::HttpMethodNotAllowed => "HttpMethodNotAllowed",
            ErrorCode::HttpServiceNotAvailable => "HttpServiceNotAvailable",
            ErrorCode::HttpTimeout => "HttpTimeout",
            ErrorCode::HttpTooManyRequests => "HttpTooManyRequests",
            ErrorCode::HttpUnexpected => "HttpUnexpected",
            ErrorCode::ServiceInvalidResponse => "ServiceInvalidResponse",
            ErrorCode::ServiceUnexpectedContentType => "ServiceUnexpectedContentType",
        }
    }

    /// Numeric value of the code.
    pub fn value(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed operation: a code from the taxonomy and an optional message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.code, .message))]
pub struct Error {
    code: ErrorCode,
    message: String,
}

fn render(code: &ErrorCode, message: &str) -> String {
    if message.is_empty() {
        code.to_string()
    } else {
        format!("{code}: {message}")
    }
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, String::new())
    }
}

/// Build an [`Error`], log it once through the given reporting handler with
/// the caller's location, and return it from the enclosing function.
macro_rules! sfs_bail {
    ($handler:expr, $code:ident, $($arg:tt)+) => {{
        let err = $crate::error::Error::new($crate::error::ErrorCode::$code, format!($($arg)+));
        $handler.log_error(&err, file!(), line!());
        return Err(err.into());
    }};
}

/// Like [`sfs_bail!`] but only when `$cond` does not hold.
macro_rules! sfs_ensure {
    ($cond:expr, $handler:expr, $code:ident, $($arg:tt)+) => {
        if !$cond {
            $crate::error::sfs_bail!($handler, $code, $($arg)+);
        }
    };
}

/// Log an already constructed error at its point of detection and return it.
macro_rules! sfs_raise {
    ($handler:expr, $err:expr) => {{
        let err: $crate::error::Error = $err;
        $handler.log_error(&err, file!(), line!());
        return Err(err.into());
    }};
}

pub(crate) use {sfs_bail, sfs_ensure, sfs_raise};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = Error::new(ErrorCode::HttpNotFound, "404 Not Found");
        assert_eq!(err.to_string(), "HttpNotFound: 404 Not Found");
    }

    #[test]
    fn display_without_message_is_code_only() {
        let err = Error::from(ErrorCode::NotSet);
        assert_eq!(err.to_string(), "NotSet");
        assert!(err.message().is_empty());
    }

    #[test]
    fn codes_are_grouped_by_range() {
        assert_eq!(ErrorCode::InvalidArg.value() & 0xFFFF_FF00, 0x8000_0000);
        assert_eq!(ErrorCode::ConnectionUrlSetupFailed.value() & 0xFFFF_FF00, 0x8000_0100);
        assert_eq!(ErrorCode::HttpTimeout.value() & 0xFFFF_FF00, 0x8000_0200);
        assert_eq!(ErrorCode::ServiceInvalidResponse.value() & 0xFFFF_FF00, 0x8000_0300);
    }
}
