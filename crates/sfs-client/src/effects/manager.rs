use crate::data::ConnectionConfig;
use crate::error::Result;
use crate::reporting::ReportingHandler;

use super::connection::Connection;

/// Factory of [`Connection`]s.
///
/// One manager serves a whole client; every call creates its own connection,
/// so connections made by one manager can be used from different threads.
pub trait ConnectionManager: Send + Sync {
    fn make_connection(&self, config: &ConnectionConfig, handler: &ReportingHandler) -> Result<Connection>;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::sync::{Mutex, MutexGuard};

    use once_cell::sync::Lazy;

    use super::*;
    use crate::effects::http::{ReqwestTransport, TransportError};
    use crate::error::{Error, sfs_bail, sfs_raise};
    use crate::reporting::log_verbose;

    /// Transport state shared by every live manager of the process.
    #[derive(Default)]
    struct Shared {
        managers: usize,
        transport: Option<ReqwestTransport>,
    }

    static SHARED: Lazy<Mutex<Shared>> = Lazy::new(|| Mutex::new(Shared::default()));

    fn shared() -> MutexGuard<'static, Shared> {
        SHARED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Manager backed by `reqwest`.
    ///
    /// The first live manager builds a transport whose connection pool is
    /// shared by every connection without a proxy; the last one to be dropped
    /// releases it.
    #[derive(Debug)]
    pub struct ReqwestConnectionManager {
        _private: (),
    }

    impl ReqwestConnectionManager {
        pub fn new(handler: &ReportingHandler) -> Result<Self> {
            let mut shared = shared();
            if shared.managers == 0 {
                match ReqwestTransport::new(None) {
                    Ok(transport) => shared.transport = Some(transport),
                    Err(err) => sfs_bail!(handler, HttpUnexpected, "Failed to initialize the HTTP transport: {err}"),
                }
                log_verbose!(handler, "HTTP transport initialized");
            }
            shared.managers += 1;

            Ok(Self { _private: () })
        }
    }

    impl Drop for ReqwestConnectionManager {
        fn drop(&mut self) {
            let mut shared = shared();
            shared.managers = shared.managers.saturating_sub(1);
            if shared.managers == 0 {
                shared.transport = None;
                tracing::debug!(target: "sfs_client", "HTTP transport released");
            }
        }
    }

    impl ConnectionManager for ReqwestConnectionManager {
        fn make_connection(&self, config: &ConnectionConfig, handler: &ReportingHandler) -> Result<Connection> {
            let transport = match config.proxy.as_deref() {
                Some(proxy) => ReqwestTransport::new(Some(proxy)),
                None => shared()
                    .transport
                    .clone()
                    .ok_or_else(|| TransportError::Setup("HTTP transport is not initialized".into())),
            };

            match transport {
                Ok(transport) => Connection::new(Box::new(transport), config, handler.clone()),
                Err(err) => sfs_raise!(handler, Error::from(err)),
            }
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestConnectionManager;
