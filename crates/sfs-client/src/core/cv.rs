//! Correlation vector attached to every request as the `MS-CV` header.
//!
//! A vector is a base64 base followed by dot separated counters, e.g.
//! `tul4NUsfs0mQ8n4+6D0E8Q.0`. Each logical call increments the last counter.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::RngCore;
use thiserror::Error;

use crate::error::{Error, ErrorCode, Result};

const V1_BASE_LENGTH: usize = 16;
const V2_BASE_LENGTH: usize = 22;
const V1_MAX_LENGTH: usize = 63;
const V2_MAX_LENGTH: usize = 127;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationVectorError {
    #[error("correlation vector is empty")]
    Empty,

    #[error("invalid base \"{0}\", expected 16 or 22 base64 characters")]
    InvalidBase(String),

    #[error("invalid extension \"{0}\"")]
    InvalidExtension(String),

    #[error("correlation vector cannot be extended beyond {max} characters")]
    TooLong { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationVector {
    prefix: String,
    extension: u32,
    max_length: usize,
    used: bool,
}

impl Default for CorrelationVector {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationVector {
    /// Start a new vector from a random base.
    pub fn new() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);

        Self {
            prefix: STANDARD_NO_PAD.encode(bytes),
            extension: 0,
            max_length: V2_MAX_LENGTH,
            used: false,
        }
    }

    /// Extend an existing vector received from the caller.
    pub fn with_base(base: &str) -> Result<Self> {
        Self::extend(base).map_err(|err| {
            Error::new(
                ErrorCode::InvalidArg,
                format!("Failed to set base correlation vector: {err}"),
            )
        })
    }

    fn extend(base: &str) -> std::result::Result<Self, CorrelationVectorError> {
        let max_length = validate(base)?;
        if base.len() + 2 > max_length {
            return Err(CorrelationVectorError::TooLong { max: max_length });
        }

        Ok(Self {
            prefix: base.to_string(),
            extension: 0,
            max_length,
            used: false,
        })
    }

    /// Value for the next logical call.
    ///
    /// The first call returns the vector ending in `.0`; every later call
    /// increments the last counter first. A vector at its maximum length
    /// keeps returning its current value.
    pub fn increment_and_get(&mut self) -> String {
        if self.used {
            let next = self.extension.saturating_add(1);
            if self.render_with(next).len() <= self.max_length {
                self.extension = next;
            }
        }
        self.used = true;
        self.value()
    }

    /// Current value without incrementing.
    pub fn value(&self) -> String {
        self.render_with(self.extension)
    }

    fn render_with(&self, extension: u32) -> String {
        format!("{}.{}", self.prefix, extension)
    }
}

impl std::fmt::Display for CorrelationVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value())
    }
}

/// Check the syntax of a vector and return the maximum length of its version.
fn validate(cv: &str) -> std::result::Result<usize, CorrelationVectorError> {
    if cv.is_empty() {
        return Err(CorrelationVectorError::Empty);
    }

    let mut parts = cv.split('.');
    let base = parts.next().unwrap_or_default();
    let max_length = match base.len() {
        V1_BASE_LENGTH => V1_MAX_LENGTH,
        V2_BASE_LENGTH => V2_MAX_LENGTH,
        _ => return Err(CorrelationVectorError::InvalidBase(base.to_string())),
    };

    if !base
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return Err(CorrelationVectorError::InvalidBase(base.to_string()));
    }

    for extension in parts {
        if extension.is_empty()
            || !extension.bytes().all(|b| b.is_ascii_digit())
            || extension.parse::<u32>().is_err()
        {
            return Err(CorrelationVectorError::InvalidExtension(extension.to_string()));
        }
    }

    if cv.len() > max_length {
        return Err(CorrelationVectorError::TooLong { max: max_length });
    }

    Ok(max_length)
}
