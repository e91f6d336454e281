//! Incremental URL construction.
//!
//! Path segments and query pairs are percent-encoded as they are added, so
//! the rendered URL never needs a second escaping pass.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};
use url::{Host, Url};

use crate::error::{Result, sfs_bail, sfs_ensure};
use crate::reporting::ReportingHandler;

/// Characters escaped inside a path. `/` is kept as the segment separator.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%');

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &PATH.add(b'/');

/// Characters escaped inside a query key or value.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UrlBuilder {
    scheme: Option<Scheme>,
    host: Option<String>,
    port: Option<u16>,
    // Encoded, without the leading '/'.
    path: String,
    // Encoded key/value pairs.
    query: Vec<(String, String)>,
    handler: ReportingHandler,
}

impl UrlBuilder {
    pub fn new(handler: ReportingHandler) -> Self {
        Self {
            scheme: None,
            host: None,
            port: None,
            path: String::new(),
            query: Vec::new(),
            handler,
        }
    }

    /// Render the URL. Fails if the scheme or host was never set.
    pub fn get_url(&self) -> Result<String> {
        let Some(scheme) = self.scheme else {
            sfs_bail!(self.handler, ConnectionUrlSetupFailed, "URL is missing a scheme");
        };
        let Some(host) = self.host.as_deref() else {
            sfs_bail!(self.handler, ConnectionUrlSetupFailed, "URL is missing a host");
        };

        let mut url = format!("{scheme}://{host}");
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        url.push('/');
        url.push_str(&self.path);

        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }

        Ok(url)
    }

    pub fn set_scheme(&mut self, scheme: Scheme) -> &mut Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn set_host(&mut self, host: &str) -> Result<&mut Self> {
        sfs_ensure!(!host.is_empty(), self.handler, InvalidArg, "Host must not be empty");
        if let Err(err) = Host::parse(host) {
            sfs_bail!(self.handler, ConnectionUrlSetupFailed, "Invalid host \"{host}\": {err}");
        }

        self.host = Some(host.to_string());
        Ok(self)
    }

    pub fn set_port(&mut self, port: Option<u16>) -> &mut Self {
        self.port = port;
        self
    }

    /// Replace the path. `/` separates segments, everything else is escaped.
    pub fn set_path(&mut self, path: &str) -> Result<&mut Self> {
        self.reset_path();
        if path.is_empty() {
            return Ok(self);
        }
        self.append_path(path)
    }

    /// Append to the path, adding a separator when needed.
    pub fn append_path(&mut self, path: &str) -> Result<&mut Self> {
        sfs_ensure!(!path.is_empty(), self.handler, InvalidArg, "Path must not be empty");
        let encoded = utf8_percent_encode(path, PATH).to_string();
        self.push_path(&encoded);
        Ok(self)
    }

    /// Append a single segment, escaping `/` as well.
    pub fn append_path_encoded(&mut self, segment: &str) -> Result<&mut Self> {
        sfs_ensure!(!segment.is_empty(), self.handler, InvalidArg, "Path must not be empty");
        let encoded = utf8_percent_encode(segment, SEGMENT).to_string();
        self.push_path(&encoded);
        Ok(self)
    }

    pub fn reset_path(&mut self) -> &mut Self {
        self.path.clear();
        self
    }

    /// Replace the query with a single pair.
    pub fn set_query(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.reset_query();
        self.append_query(key, value)
    }

    pub fn append_query(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        sfs_ensure!(!key.is_empty(), self.handler, InvalidArg, "Query key must not be empty");
        sfs_ensure!(!value.is_empty(), self.handler, InvalidArg, "Query value must not be empty");

        self.query.push((
            utf8_percent_encode(key, QUERY).to_string(),
            utf8_percent_encode(value, QUERY).to_string(),
        ));
        Ok(self)
    }

    pub fn reset_query(&mut self) -> &mut Self {
        self.query.clear();
        self
    }

    /// Replace the whole state with the parts of `url`.
    pub fn set_url(&mut self, url: &str) -> Result<&mut Self> {
        sfs_ensure!(!url.is_empty(), self.handler, InvalidArg, "URL must not be empty");

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => sfs_bail!(self.handler, ConnectionUrlSetupFailed, "Invalid URL \"{url}\": {err}"),
        };

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => sfs_bail!(self.handler, ConnectionUrlSetupFailed, "Unsupported URL scheme \"{other}\""),
        };
        let Some(host) = parsed.host_str() else {
            sfs_bail!(self.handler, ConnectionUrlSetupFailed, "URL \"{url}\" has no host");
        };

        self.scheme = Some(scheme);
        self.host = Some(host.to_string());
        self.port = parsed.port();
        self.path = parsed.path().trim_start_matches('/').to_string();
        self.query = parsed
            .query_pairs()
            .map(|(k, v)| {
                (
                    utf8_percent_encode(&k, QUERY).to_string(),
                    utf8_percent_encode(&v, QUERY).to_string(),
                )
            })
            .collect();
        Ok(self)
    }

    /// The encoded path, without the leading `/`.
    pub(crate) fn encoded_path(&self) -> &str {
        &self.path
    }

    /// Replace the path with one that is already encoded.
    pub(crate) fn set_encoded_path(&mut self, encoded: &str) -> &mut Self {
        self.path = encoded.trim_start_matches('/').to_string();
        self
    }

    fn push_path(&mut self, encoded: &str) {
        let encoded = encoded.trim_start_matches('/');
        if !self.path.is_empty() && !self.path.ends_with('/') {
            self.path.push('/');
        }
        self.path.push_str(encoded);
    }
}
