//! Builder for [`ObjectStoreClient`].

use super::{ObjectStoreClient, waiters::WaiterConfig};
use crate::errors::{ClientError, ClientResult};
use reqwest::Url;
use std::env;
use tracing::debug;

/// Environment variable holding the default server URL.
pub const DEFAULT_SERVER_URL_ENV: &str = "MS3_SERVER_URL";

/// Configures and builds an [`ObjectStoreClient`].
///
/// ```no_run
/// # fn demo() -> ms3_client::ClientResult<()> {
/// let client = ms3_client::ClientBuilder::standard()
///     .server_url("http://127.0.0.1:3000/")
///     .build()?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    server_url: Option<String>,
    http_client: Option<reqwest::Client>,
    waiter_config: WaiterConfig,
}

impl ClientBuilder {
    /// A builder seeded with the default server URL from `MS3_SERVER_URL`,
    /// if set.
    pub fn standard() -> Self {
        Self {
            server_url: env::var(DEFAULT_SERVER_URL_ENV).ok(),
            ..Self::default()
        }
    }

    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// Use a preconfigured transport (timeouts, proxies, TLS roots, ...).
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn waiter_config(mut self, waiter_config: WaiterConfig) -> Self {
        self.waiter_config = waiter_config;
        self
    }

    pub fn build(self) -> ClientResult<ObjectStoreClient> {
        let raw = self.server_url.ok_or_else(|| {
            ClientError::InvalidUrl(format!(
                "no server url configured; set {} or call server_url()",
                DEFAULT_SERVER_URL_ENV
            ))
        })?;
        let server_url = normalize_server_url(&raw)?;
        debug!(%server_url, "building ms3 client");

        Ok(ObjectStoreClient::new(
            server_url,
            self.http_client.unwrap_or_default(),
            self.waiter_config,
        ))
    }
}

/// Parse the base URL, appending the trailing `/` every API path relies on.
fn normalize_server_url(raw: &str) -> ClientResult<Url> {
    let mut text = raw.trim().to_string();
    if !text.ends_with('/') {
        text.push('/');
    }
    let url = Url::parse(&text).map_err(|err| ClientError::InvalidUrl(format!("`{}`: {}", raw, err)))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(format!("`{}` cannot be a base url", raw)));
    }
    Ok(url)
}
