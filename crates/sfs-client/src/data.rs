//! Immutable data types exchanged with callers.
//!
//! Configuration going in, resolved contents and files coming out. These
//! types perform no I/O.

pub mod config;
pub mod content;
pub mod file;

pub use config::{
    ClientConfig, ConnectionConfig, ProductRequest, RequestParams, DEFAULT_BASE_RETRY_DELAY,
    DEFAULT_MAX_RETRIES,
};
pub use content::{AppContent, AppPrerequisiteContent, Content, ContentId};
pub use file::{AppFile, ApplicabilityDetails, Architecture, File, HashType};
