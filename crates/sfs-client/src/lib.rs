//! Client for the SFS content service.
//!
//! Resolves the latest (or a specific) version of a product and the download
//! information of its files, including platform applicability and
//! prerequisites for app products.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and result types
//! - [`core`] - Pure logic: correlation vectors, URLs, retry policy, response entities
//! - [`effects`] - I/O operations behind the [`Transport`] trait
//!
//! # Key Features
//!
//! - **Blocking**: Every call runs on the caller's thread, retries and backoff included
//! - **Bounded Retries**: Only 429/500/502/503/504 are retried, honoring `Retry-After`
//! - **Strict Responses**: Every field of a response is checked before it is returned
//! - **Correlated**: Each call carries an incrementing `MS-CV` correlation vector

pub mod core;
pub mod data;
pub mod effects;
mod error;
pub mod reporting;

pub use crate::core::{ContentType, CorrelationVector, retry_delay};
pub use data::{
    AppContent, AppFile, AppPrerequisiteContent, ApplicabilityDetails, Architecture, ClientConfig,
    ConnectionConfig, Content, ContentId, File, HashType, ProductRequest, RequestParams,
};
pub use effects::{Connection, ConnectionManager, SfsClient, Transport};
pub use error::{Error, ErrorCode, Result};
pub use reporting::{LogData, LogSeverity, LoggingCallback, ReportingHandler};

#[cfg(feature = "reqwest")]
pub use effects::{ReqwestConnectionManager, ReqwestTransport};
