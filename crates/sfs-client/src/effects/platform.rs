//! Host description for the `User-Agent` header.

use once_cell::sync::Lazy;
use sysinfo::System;

static USER_AGENT: Lazy<String> = Lazy::new(|| {
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        platform(),
        arch()
    )
});

/// `<name>/<version> (<platform>; <arch>)`, computed once per process.
pub fn user_agent() -> &'static str {
    USER_AGENT.as_str()
}

fn platform() -> String {
    match (System::name(), System::os_version()) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(name), None) => name,
        _ => std::env::consts::OS.to_string(),
    }
}

fn arch() -> String {
    let arch = System::cpu_arch();
    if arch.is_empty() {
        std::env::consts::ARCH.to_string()
    } else {
        arch
    }
}
