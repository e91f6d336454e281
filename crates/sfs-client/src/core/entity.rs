//! Wire-shaped intermediates parsed from service responses.
//!
//! Each entity comes in a generic and an app flavour, told apart by the
//! presence of a marker field in the JSON. Parsing validates the structure;
//! conversion into the public types in [`crate::data`] consumes the entity and
//! checks it is of the flavour the caller expects.

mod file;
mod version;

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{Result, sfs_bail};
use crate::reporting::ReportingHandler;

pub use file::{AppFileEntity, FileEntity, GenericFileEntity, download_info_response_to_file_entities};
pub use version::{AppVersionEntity, ContentIdEntity, GenericVersionEntity, VersionEntity};

/// Flavour of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Generic,
    App,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Generic => write!(f, "Generic"),
            ContentType::App => write!(f, "App"),
        }
    }
}

/// Look up the last segment of `path` in `object`.
///
/// `path` is the dotted location used in error messages, e.g. `ContentId.Name`.
fn require<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    handler: &ReportingHandler,
) -> Result<&'a Value> {
    let key = path.rsplit('.').next().unwrap_or(path);
    match object.get(key) {
        Some(value) => Ok(value),
        None => sfs_bail!(handler, ServiceInvalidResponse, "Missing {path} in response"),
    }
}

fn require_str<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    handler: &ReportingHandler,
) -> Result<&'a str> {
    match require(object, path, handler)?.as_str() {
        Some(value) => Ok(value),
        None => sfs_bail!(handler, ServiceInvalidResponse, "{path} is not a string"),
    }
}

fn require_object<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    handler: &ReportingHandler,
) -> Result<&'a Map<String, Value>> {
    match require(object, path, handler)?.as_object() {
        Some(value) => Ok(value),
        None => sfs_bail!(handler, ServiceInvalidResponse, "{path} is not an object"),
    }
}

fn require_array<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    handler: &ReportingHandler,
) -> Result<&'a Vec<Value>> {
    match require(object, path, handler)?.as_array() {
        Some(value) => Ok(value),
        None => sfs_bail!(handler, ServiceInvalidResponse, "{path} is not an array"),
    }
}

/// An array whose elements must all be strings.
fn require_string_array(
    object: &Map<String, Value>,
    path: &str,
    handler: &ReportingHandler,
) -> Result<Vec<String>> {
    require_array(object, path, handler)?
        .iter()
        .map(|value| -> Result<String> {
            match value.as_str() {
                Some(value) => Ok(value.to_string()),
                None => sfs_bail!(handler, ServiceInvalidResponse, "{path} array value is not a string"),
            }
        })
        .collect()
}
