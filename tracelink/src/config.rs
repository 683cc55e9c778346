//! Client configuration.
//!
//! Settings are constructed once at startup and passed by reference into the
//! reporter and transport constructors; there is no process-global state.
//! Defaults can be overridden programmatically through [`ConfigBuilder`] or
//! through `TRACELINK_*` environment variables, with unparseable values
//! silently falling back to the defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::transport::Encryption;

/// Component name reported in runtime metadata.
pub(crate) const TRACELINK_COMPONENT_NAME: &str = "TRACELINK_COMPONENT_NAME";
/// Access token presented to the collector.
pub(crate) const TRACELINK_ACCESS_TOKEN: &str = "TRACELINK_ACCESS_TOKEN";
/// Collector hostname.
pub(crate) const TRACELINK_COLLECTOR_HOST: &str = "TRACELINK_COLLECTOR_HOST";
/// Collector port.
pub(crate) const TRACELINK_COLLECTOR_PORT: &str = "TRACELINK_COLLECTOR_PORT";
/// Whether to verify the collector's certificate over encrypted transport.
pub(crate) const TRACELINK_SSL_VERIFY_PEER: &str = "TRACELINK_SSL_VERIFY_PEER";
/// Transport diagnostic verbosity.
pub(crate) const TRACELINK_VERBOSITY: &str = "TRACELINK_VERBOSITY";
/// Maximum number of finished spans held between flushes.
pub(crate) const TRACELINK_MAX_BUFFERED_SPANS: &str = "TRACELINK_MAX_BUFFERED_SPANS";

/// Default collector hostname.
pub(crate) const DEFAULT_COLLECTOR_HOST: &str = "localhost";
/// Default collector port.
pub(crate) const DEFAULT_COLLECTOR_PORT: u16 = 4140;
/// Default timeout for establishing a collector connection.
pub(crate) const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(20);
/// Default timeout for reading a collector response.
pub(crate) const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(20);
/// Default keep-alive timeout for pooled collector connections.
pub(crate) const DEFAULT_KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(2);
/// Default transport diagnostic verbosity.
pub(crate) const DEFAULT_VERBOSITY: u32 = 1;
/// Default reporter buffer bound.
pub(crate) const DEFAULT_MAX_BUFFERED_SPANS: usize = 1000;

/// Collector and reporter settings.
///
/// Read-only input to reporter and transport construction.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
    /// Name of the service reporting spans.
    pub component_name: String,
    /// Token presented to the collector with every report.
    pub access_token: String,
    /// Collector hostname.
    pub collector_host: String,
    /// Collector port. Port 443 selects encrypted transport, see
    /// [`Config::encryption`].
    pub collector_port: u16,
    /// Verify the collector's certificate when transport is encrypted.
    pub verify_peer: bool,
    /// Timeout for establishing a collector connection.
    pub open_timeout: Duration,
    /// Timeout for reading a collector response.
    pub read_timeout: Duration,
    /// Keep-alive timeout for pooled collector connections.
    pub keep_alive_timeout: Duration,
    /// Transport diagnostic verbosity; 0 silences transport diagnostics.
    pub verbosity: u32,
    /// Maximum finished spans buffered between flushes. Overflow is dropped
    /// and counted, see [`Reporter::enqueue`](crate::Reporter::enqueue).
    pub max_buffered_spans: usize,
}

impl Default for Config {
    /// Defaults with environment overrides applied.
    fn default() -> Self {
        ConfigBuilder::default().build()
    }
}

impl Config {
    /// Start building a configuration. The builder is seeded with the
    /// defaults and any `TRACELINK_*` environment overrides.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Transport security implied by the collector port: 443 means
    /// encrypted, anything else means plaintext. This mapping is part of
    /// the public contract.
    pub fn encryption(&self) -> Encryption {
        if self.collector_port == 443 {
            Encryption::Tls
        } else {
            Encryption::Plaintext
        }
    }
}

/// A builder for [`Config`] instances.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    component_name: String,
    access_token: String,
    collector_host: String,
    collector_port: u16,
    verify_peer: bool,
    open_timeout: Duration,
    read_timeout: Duration,
    keep_alive_timeout: Duration,
    verbosity: u32,
    max_buffered_spans: usize,
}

impl Default for ConfigBuilder {
    /// Create a builder initialized with the default settings, overridden by
    /// environment variables where set. The supported variables are:
    /// * `TRACELINK_COMPONENT_NAME`
    /// * `TRACELINK_ACCESS_TOKEN`
    /// * `TRACELINK_COLLECTOR_HOST`
    /// * `TRACELINK_COLLECTOR_PORT`
    /// * `TRACELINK_SSL_VERIFY_PEER`
    /// * `TRACELINK_VERBOSITY`
    /// * `TRACELINK_MAX_BUFFERED_SPANS`
    fn default() -> Self {
        ConfigBuilder {
            component_name: String::new(),
            access_token: String::new(),
            collector_host: DEFAULT_COLLECTOR_HOST.to_owned(),
            collector_port: DEFAULT_COLLECTOR_PORT,
            verify_peer: true,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            keep_alive_timeout: DEFAULT_KEEP_ALIVE_TIMEOUT,
            verbosity: DEFAULT_VERBOSITY,
            max_buffered_spans: DEFAULT_MAX_BUFFERED_SPANS,
        }
        .init_from_env_vars()
    }
}

impl ConfigBuilder {
    /// Set the component name reported in runtime metadata.
    pub fn with_component_name(mut self, component_name: impl Into<String>) -> Self {
        self.component_name = component_name.into();
        self
    }

    /// Set the collector access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = access_token.into();
        self
    }

    /// Set the collector hostname.
    pub fn with_collector_host(mut self, collector_host: impl Into<String>) -> Self {
        self.collector_host = collector_host.into();
        self
    }

    /// Set the collector port. Port 443 selects encrypted transport.
    pub fn with_collector_port(mut self, collector_port: u16) -> Self {
        self.collector_port = collector_port;
        self
    }

    /// Set whether the collector's certificate is verified.
    pub fn with_verify_peer(mut self, verify_peer: bool) -> Self {
        self.verify_peer = verify_peer;
        self
    }

    /// Set the connection-open timeout.
    pub fn with_open_timeout(mut self, open_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self
    }

    /// Set the response-read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set the keep-alive timeout for pooled connections.
    pub fn with_keep_alive_timeout(mut self, keep_alive_timeout: Duration) -> Self {
        self.keep_alive_timeout = keep_alive_timeout;
        self
    }

    /// Set the transport diagnostic verbosity.
    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the reporter buffer bound.
    pub fn with_max_buffered_spans(mut self, max_buffered_spans: usize) -> Self {
        self.max_buffered_spans = max_buffered_spans;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        Config {
            component_name: self.component_name,
            access_token: self.access_token,
            collector_host: self.collector_host,
            collector_port: self.collector_port,
            verify_peer: self.verify_peer,
            open_timeout: self.open_timeout,
            read_timeout: self.read_timeout,
            keep_alive_timeout: self.keep_alive_timeout,
            verbosity: self.verbosity,
            max_buffered_spans: self.max_buffered_spans,
        }
    }

    fn init_from_env_vars(mut self) -> Self {
        if let Ok(component_name) = env::var(TRACELINK_COMPONENT_NAME) {
            self.component_name = component_name;
        }

        if let Ok(access_token) = env::var(TRACELINK_ACCESS_TOKEN) {
            self.access_token = access_token;
        }

        if let Ok(collector_host) = env::var(TRACELINK_COLLECTOR_HOST) {
            self.collector_host = collector_host;
        }

        if let Some(collector_port) = env::var(TRACELINK_COLLECTOR_PORT)
            .ok()
            .and_then(|port| u16::from_str(&port).ok())
        {
            self.collector_port = collector_port;
        }

        if let Some(verify_peer) = env::var(TRACELINK_SSL_VERIFY_PEER)
            .ok()
            .and_then(|verify| bool::from_str(&verify).ok())
        {
            self.verify_peer = verify_peer;
        }

        if let Some(verbosity) = env::var(TRACELINK_VERBOSITY)
            .ok()
            .and_then(|verbosity| u32::from_str(&verbosity).ok())
        {
            self.verbosity = verbosity;
        }

        if let Some(max_buffered_spans) = env::var(TRACELINK_MAX_BUFFERED_SPANS)
            .ok()
            .and_then(|max| usize::from_str(&max).ok())
        {
            self.max_buffered_spans = max_buffered_spans;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL_ENV_VARS: [&str; 7] = [
        TRACELINK_COMPONENT_NAME,
        TRACELINK_ACCESS_TOKEN,
        TRACELINK_COLLECTOR_HOST,
        TRACELINK_COLLECTOR_PORT,
        TRACELINK_SSL_VERIFY_PEER,
        TRACELINK_VERBOSITY,
        TRACELINK_MAX_BUFFERED_SPANS,
    ];

    #[test]
    fn default_config_uses_documented_defaults() {
        let config = temp_env::with_vars_unset(ALL_ENV_VARS, Config::default);

        assert!(config.component_name.is_empty());
        assert!(config.access_token.is_empty());
        assert_eq!(config.collector_host, DEFAULT_COLLECTOR_HOST);
        assert_eq!(config.collector_port, DEFAULT_COLLECTOR_PORT);
        assert!(config.verify_peer);
        assert_eq!(config.open_timeout, DEFAULT_OPEN_TIMEOUT);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
        assert_eq!(config.keep_alive_timeout, DEFAULT_KEEP_ALIVE_TIMEOUT);
        assert_eq!(config.verbosity, DEFAULT_VERBOSITY);
        assert_eq!(config.max_buffered_spans, DEFAULT_MAX_BUFFERED_SPANS);
    }

    #[test]
    fn config_configurable_by_env_vars() {
        let env_vars = vec![
            (TRACELINK_COMPONENT_NAME, Some("checkout")),
            (TRACELINK_ACCESS_TOKEN, Some("s3cr3t")),
            (TRACELINK_COLLECTOR_HOST, Some("collector.internal")),
            (TRACELINK_COLLECTOR_PORT, Some("443")),
            (TRACELINK_SSL_VERIFY_PEER, Some("false")),
            (TRACELINK_VERBOSITY, Some("3")),
            (TRACELINK_MAX_BUFFERED_SPANS, Some("64")),
        ];

        let config = temp_env::with_vars(env_vars, Config::default);

        assert_eq!(config.component_name, "checkout");
        assert_eq!(config.access_token, "s3cr3t");
        assert_eq!(config.collector_host, "collector.internal");
        assert_eq!(config.collector_port, 443);
        assert!(!config.verify_peer);
        assert_eq!(config.verbosity, 3);
        assert_eq!(config.max_buffered_spans, 64);
    }

    #[test]
    fn unparseable_env_values_fall_back_to_defaults() {
        let env_vars = vec![
            (TRACELINK_COLLECTOR_PORT, Some("not-a-port")),
            (TRACELINK_SSL_VERIFY_PEER, Some("yes")),
            (TRACELINK_VERBOSITY, Some("-3")),
            (TRACELINK_MAX_BUFFERED_SPANS, Some("many")),
        ];

        let config = temp_env::with_vars(env_vars, Config::default);

        assert_eq!(config.collector_port, DEFAULT_COLLECTOR_PORT);
        assert!(config.verify_peer);
        assert_eq!(config.verbosity, DEFAULT_VERBOSITY);
        assert_eq!(config.max_buffered_spans, DEFAULT_MAX_BUFFERED_SPANS);
    }

    #[test]
    fn builder_setters_override_defaults() {
        let config = temp_env::with_vars_unset(ALL_ENV_VARS, || {
            Config::builder()
                .with_component_name("payments")
                .with_access_token("token")
                .with_collector_host("collector.example.com")
                .with_collector_port(8080)
                .with_verify_peer(false)
                .with_open_timeout(Duration::from_secs(5))
                .with_read_timeout(Duration::from_secs(6))
                .with_keep_alive_timeout(Duration::from_secs(7))
                .with_verbosity(0)
                .with_max_buffered_spans(128)
                .build()
        });

        assert_eq!(config.component_name, "payments");
        assert_eq!(config.access_token, "token");
        assert_eq!(config.collector_host, "collector.example.com");
        assert_eq!(config.collector_port, 8080);
        assert!(!config.verify_peer);
        assert_eq!(config.open_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(6));
        assert_eq!(config.keep_alive_timeout, Duration::from_secs(7));
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.max_buffered_spans, 128);
    }

    #[rstest]
    #[case(443, Encryption::Tls)]
    #[case(4140, Encryption::Plaintext)]
    #[case(8443, Encryption::Plaintext)]
    #[case(80, Encryption::Plaintext)]
    fn port_selects_encryption(#[case] port: u16, #[case] expected: Encryption) {
        let config = Config::builder().with_collector_port(port).build();
        assert_eq!(config.encryption(), expected);
    }
}
