//! Where and how an [`Application`](crate::server::Application) listens.

use std::path::PathBuf;
use std::str::FromStr;

use tokio_util::sync::CancellationToken;

use crate::server::ApplicationError;

/// The registered gemini port.
pub const DEFAULT_PORT: u16 = 1965;

const DEFAULT_HOSTNAME: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub hostname: String,
    pub port: u16,
    pub transport: Transport,
    /// Closes the application once cancelled.
    pub signal: Option<CancellationToken>,
}

#[derive(Debug, Clone, Default)]
pub enum Transport {
    #[default]
    Plain,
    Tls(TlsOptions),
}

/// Certificate material for the encrypted transport, as PEM files.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub alpn_protocols: Vec<Vec<u8>>,
}

impl TlsOptions {
    pub fn new<C: Into<PathBuf>, K: Into<PathBuf>>(cert_path: C, key_path: K) -> Self {
        Self { cert_path: cert_path.into(), key_path: key_path.into(), alpn_protocols: Vec::new() }
    }
}

impl ListenOptions {
    pub fn plain<S: Into<String>>(hostname: S, port: u16) -> Self {
        Self { hostname: hostname.into(), port, transport: Transport::Plain, signal: None }
    }

    pub fn tls<S: Into<String>>(hostname: S, port: u16, tls: TlsOptions) -> Self {
        Self { hostname: hostname.into(), port, transport: Transport::Tls(tls), signal: None }
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn is_secure(&self) -> bool {
        matches!(self.transport, Transport::Tls(_))
    }

    /// The `host:port` form accepted by `TcpListener::bind`.
    pub(crate) fn bind_address(&self) -> String {
        let hostname = if self.hostname.is_empty() { DEFAULT_HOSTNAME } else { &self.hostname };
        if hostname.contains(':') {
            format!("[{}]:{}", hostname, self.port)
        } else {
            format!("{}:{}", hostname, self.port)
        }
    }
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self::plain(DEFAULT_HOSTNAME, DEFAULT_PORT)
    }
}

/// Parses `host:port`, `[v6-host]:port` or `:port` into plain TCP options.
///
/// The port is one to five digits and must fit in a `u16`; an empty host
/// listens on every interface.
impl FromStr for ListenOptions {
    type Err = ApplicationError;

    fn from_str(addr: &str) -> Result<Self, Self::Err> {
        let invalid = || ApplicationError::invalid_address(addr);

        let (hostname, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        if port.is_empty() || port.len() > 5 || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_e| invalid())?;

        let hostname = hostname.strip_prefix('[').unwrap_or(hostname);
        let hostname = hostname.strip_suffix(']').unwrap_or(hostname);
        if hostname.contains(']') {
            return Err(invalid());
        }

        let hostname = if hostname.is_empty() { DEFAULT_HOSTNAME } else { hostname };
        Ok(Self::plain(hostname, port))
    }
}

/// Values [`Application::listen`](crate::server::Application::listen) accepts.
pub trait IntoListenOptions {
    fn into_listen_options(self) -> Result<ListenOptions, ApplicationError>;
}

impl IntoListenOptions for ListenOptions {
    fn into_listen_options(self) -> Result<ListenOptions, ApplicationError> {
        Ok(self)
    }
}

impl IntoListenOptions for &str {
    fn into_listen_options(self) -> Result<ListenOptions, ApplicationError> {
        self.parse()
    }
}

impl IntoListenOptions for String {
    fn into_listen_options(self) -> Result<ListenOptions, ApplicationError> {
        self.parse()
    }
}

impl IntoListenOptions for &String {
    fn into_listen_options(self) -> Result<ListenOptions, ApplicationError> {
        self.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(addr: &str) -> ListenOptions {
        addr.parse().unwrap()
    }

    #[test]
    fn host_and_port() {
        let options = parse("127.0.0.1:1965");
        assert_eq!(options.hostname, "127.0.0.1");
        assert_eq!(options.port, 1965);
        assert!(!options.is_secure());
        assert_eq!(options.bind_address(), "127.0.0.1:1965");
    }

    #[test]
    fn port_only_listens_everywhere() {
        let options = parse(":8001");
        assert_eq!(options.hostname, "0.0.0.0");
        assert_eq!(options.port, 8001);
    }

    #[test]
    fn bracketed_ipv6() {
        let options = parse("[::1]:1965");
        assert_eq!(options.hostname, "::1");
        assert_eq!(options.bind_address(), "[::1]:1965");
    }

    #[test]
    fn bare_ipv6_splits_at_the_last_colon() {
        let options = parse("::1:1965");
        assert_eq!(options.hostname, "::1");
        assert_eq!(options.port, 1965);
    }

    #[test]
    fn malformed_addresses() {
        let malformed = [
            "localhost",
            "localhost:",
            "localhost:port",
            "localhost:123456",
            "localhost:65536",
            "[::1]]:1965",
            "host:19 65",
        ];
        for addr in malformed {
            let error = addr.parse::<ListenOptions>().unwrap_err();
            assert!(matches!(error, ApplicationError::InvalidAddress(ref a) if a == addr), "{addr} should be rejected");
        }
    }

    #[test]
    fn default_is_plain_on_the_gemini_port() {
        let options = ListenOptions::default();
        assert_eq!(options.port, DEFAULT_PORT);
        assert_eq!(options.bind_address(), "0.0.0.0:1965");
    }

    #[test]
    fn tls_options_are_secure() {
        let options = ListenOptions::tls("localhost", 1965, TlsOptions::new("cert.pem", "key.pem"));
        assert!(options.is_secure());
    }
}
