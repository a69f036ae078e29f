use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";
const USER_AGENT: &str = concat!("terraform-provider-meraki/", env!("CARGO_PKG_VERSION"));

/// Meraki Dashboard API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new API client
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        timeout: Duration,
        insecure: bool,
    ) -> Result<Self, ApiError> {
        let parsed =
            url::Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| ApiError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute::<T, ()>(Method::GET, path, None).await
    }

    /// Execute a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// Execute a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute::<(), ()>(Method::DELETE, path, None).await
    }

    pub fn organizations(&self) -> crate::api::organizations::OrganizationsApi<'_> {
        crate::api::organizations::OrganizationsApi::new(self)
    }

    pub fn admins(&self) -> crate::api::admins::AdminsApi<'_> {
        crate::api::admins::AdminsApi::new(self)
    }

    pub fn networks(&self) -> crate::api::networks::NetworksApi<'_> {
        crate::api::networks::NetworksApi::new(self)
    }

    pub fn devices(&self) -> crate::api::devices::DevicesApi<'_> {
        crate::api::devices::DevicesApi::new(self)
    }

    pub fn switch(&self) -> crate::api::switch::SwitchApi<'_> {
        crate::api::switch::SwitchApi::new(self)
    }

    pub fn appliance(&self) -> crate::api::appliance::ApplianceApi<'_> {
        crate::api::appliance::ApplianceApi::new(self)
    }

    pub fn snmp(&self) -> crate::api::snmp::SnmpApi<'_> {
        crate::api::snmp::SnmpApi::new(self)
    }

    pub fn syslog(&self) -> crate::api::syslog::SyslogApi<'_> {
        crate::api::syslog::SyslogApi::new(self)
    }

    async fn execute<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!(%method, %url, "Meraki API request");

        let mut request = self.inner.http_client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, %url, error = %e, "Meraki API request failed");
            ApiError::Request(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(%method, %url, status = status.as_u16(), body = %text, "Meraki API response");

        if !status.is_success() {
            if status != StatusCode::NOT_FOUND {
                tracing::error!(%method, %url, status = status.as_u16(), "Meraki API error response");
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_body(&text)
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let source = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(source).map_err(|e| ApiError::Decode {
        body: text.to_string(),
        source: e,
    })
}
