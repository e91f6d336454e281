//! I/O: the HTTP transport, connections with their retry loop, and the
//! client orchestrating calls to the service.

mod client;
mod connection;
mod http;
mod manager;
mod platform;

pub use client::SfsClient;
pub use connection::Connection;
pub use http::{
    HttpHeader, HttpRequest, HttpResponse, MAX_RESPONSE_LENGTH, Method, Transport, TransportError,
};
pub use manager::ConnectionManager;
pub use platform::user_agent;

#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
#[cfg(feature = "reqwest")]
pub use manager::ReqwestConnectionManager;
