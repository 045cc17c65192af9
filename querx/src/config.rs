use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{QuerxError, Result};

/// Request timeout applied by default when TLS is enabled.
pub const DEFAULT_TLS_TIMEOUT_SECS: u64 = 20;

/// Connection settings for one device.
///
/// Built with [`ClientConfig::new`] or deserialized from whatever
/// configuration source the embedding program owns. A deserialized config
/// never relaxes certificate checks unless `accept_invalid_certs` is set.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tls: bool,
    /// Skip certificate validation (self-signed or hostname-mismatched
    /// device certificates). Weakens transport security.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Bound on every request. `None` waits forever. Serialized as
    /// fractional seconds under `timeout_secs`.
    #[serde(rename = "timeout_secs", default, with = "timeout_secs")]
    pub timeout: Option<Duration>,
    /// Treat a non-2xx login answer as an error.
    #[serde(default)]
    pub strict_login: bool,
}

impl ClientConfig {
    /// Settings matching the device's usual deployment.
    ///
    /// With `tls` enabled the device certificate is accepted without
    /// validation and requests time out after
    /// [`DEFAULT_TLS_TIMEOUT_SECS`]. Without TLS no timeout is imposed.
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            tls,
            accept_invalid_certs: tls,
            timeout: tls.then_some(Duration::from_secs(DEFAULT_TLS_TIMEOUT_SECS)),
            strict_login: false,
        }
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strict_login(mut self, strict: bool) -> Self {
        self.strict_login = strict;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(QuerxError::invalid_config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(QuerxError::invalid_config("port must be between 1 and 65535"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(QuerxError::invalid_config("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Origin every device request is resolved against.
    pub fn base_url(&self) -> Result<Url> {
        let host = self.host.trim();
        let url = Url::parse(&format!("{}://{}:{}/", self.scheme(), host, self.port))?;
        Ok(url)
    }
}

mod timeout_secs {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match timeout {
            Some(t) => serializer.serialize_some(&t.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(de::Error::custom))
            .transpose()
    }
}
