use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{QuerxError, Result};

pub const LOGIN_PATH: &str = "/login.cgi";
pub const CURRENT_VALUES_PATH: &str = "/tpl/document.cgi?tpl/j/current.tpl&format=xml";

/// Authenticated access to one device.
///
/// [`HttpTransport`] talks to real hardware; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit the login form and keep whatever session cookies come back.
    async fn login(&self, username: &str, password: &str) -> Result<()>;

    /// Fetch `path` with the session established by [`Transport::login`].
    async fn get(&self, path: &str) -> Result<Vec<u8>>;
}

/// Cookie-bearing HTTP(S) transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    config: ClientConfig,
}

impl HttpTransport {
    /// Build the HTTP client. Performs no network I/O.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;
        let jar = Arc::new(Jar::default());

        let mut builder = Client::builder().cookie_provider(Arc::clone(&jar));
        if config.accept_invalid_certs {
            log::warn!("Certificate validation disabled for {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(HttpTransport {
            client,
            jar,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the cookie jar holds anything for the device origin.
    pub fn has_session(&self) -> bool {
        self.jar.cookies(&self.base_url).is_some()
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = self.base_url.join(LOGIN_PATH)?;
        let form = [("login_user", username), ("login_pass", password)];

        // The jar stores Set-Cookie headers against the device origin.
        let response = self.client.post(url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            if self.config.strict_login {
                return Err(QuerxError::LoginRejected {
                    status: status.as_u16(),
                });
            }
            log::warn!("Login to {} answered {}, continuing", self.base_url, status);
        }
        if !self.has_session() {
            log::warn!("Login to {} returned no session cookie", self.base_url);
        } else {
            log::info!("Logged in to {} as {}", self.base_url, username);
        }
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.base_url.join(path)?;
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let bytes = response.bytes().await?.to_vec();
        log::debug!("Received {} bytes from {}", bytes.len(), self.base_url);
        Ok(bytes)
    }
}
