//! Transport selection and environment-variable configuration.

#![allow(unsafe_code)]

use std::env;

/// Which concrete transport a stream should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// TCP connection to the guest's Spice endpoint.
    Tcp { host: String, port: u16, tls: bool, ticket: Option<String> },
    /// A pre-opened file descriptor shared with the guest (e.g. a vsock or
    /// hypervisor-provided channel).
    SharedFd { descriptor: i32, ticket: Option<String> },
}

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5930;

impl TransportConfig {
    /// Build a transport config from `WINRUN_SPICE_*` environment variables.
    ///
    /// If `WINRUN_SPICE_SHM_FD` is present, a shared-fd transport is
    /// selected; otherwise TCP. A `WINRUN_SPICE_PORT` that fails to parse as
    /// a `u16` falls back to the default port rather than rejecting startup
    /// (see the open question this resolves in `DESIGN.md`).
    #[must_use]
    pub fn from_env() -> Self {
        let ticket = env::var("WINRUN_SPICE_TICKET").ok();

        if let Some(fd_str) = env::var("WINRUN_SPICE_SHM_FD").ok().filter(|s| !s.is_empty()) {
            if let Ok(descriptor) = fd_str.parse::<i32>() {
                return Self::SharedFd { descriptor, ticket };
            }
            tracing::warn!(value = %fd_str, "WINRUN_SPICE_SHM_FD set but not a valid file descriptor, falling back to TCP");
        }

        let host = env::var("WINRUN_SPICE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("WINRUN_SPICE_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let tls = env::var("WINRUN_SPICE_TLS").is_ok_and(|v| v == "1");

        Self::Tcp { host, port, tls, ticket }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests mutate process environment variables and so must not run
    // concurrently with each other; `cargo test` runs tests in the same
    // binary in separate threads but each test uses a disjoint variable set
    // or cleans up after itself.

    #[test]
    fn defaults_to_tcp_with_documented_defaults() {
        unsafe {
            env::remove_var("WINRUN_SPICE_SHM_FD");
            env::remove_var("WINRUN_SPICE_HOST");
            env::remove_var("WINRUN_SPICE_PORT");
            env::remove_var("WINRUN_SPICE_TLS");
        }
        let config = TransportConfig::from_env();
        assert_eq!(
            config,
            TransportConfig::Tcp {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                tls: false,
                ticket: None,
            }
        );
    }

    #[test]
    fn unparsable_port_falls_back_to_default() {
        unsafe {
            env::remove_var("WINRUN_SPICE_SHM_FD");
            env::set_var("WINRUN_SPICE_PORT", "not-a-port");
        }
        let config = TransportConfig::from_env();
        assert_eq!(config, TransportConfig::Tcp {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: false,
            ticket: None,
        });
        unsafe {
            env::remove_var("WINRUN_SPICE_PORT");
        }
    }

    #[test]
    fn shared_fd_selected_when_present() {
        unsafe {
            env::set_var("WINRUN_SPICE_SHM_FD", "42");
        }
        let config = TransportConfig::from_env();
        assert_eq!(config, TransportConfig::SharedFd { descriptor: 42, ticket: None });
        unsafe {
            env::remove_var("WINRUN_SPICE_SHM_FD");
        }
    }
}
