//! Grafana and Grafana Cloud API access used by the resource listers.

pub mod cloud;
pub mod resources;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::generate::error::ListerError;

/// Default Grafana Cloud API endpoint
pub const DEFAULT_CLOUD_API_URL: &str = "https://grafana.com";

#[derive(Clone)]
enum Credential {
    Basic { username: String, password: String },
    Bearer(String),
}

/// Authenticated, read-only API handle shared by all listers of a pass
///
/// Cloning is cheap; every clone shares the same connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    credential: Credential,
}

impl Client {
    /// Client for a Grafana instance. `auth` is `user:password` or a service account token.
    pub fn grafana(url: &str, auth: &str) -> Result<Self> {
        let credential = match auth.split_once(':') {
            Some((username, password)) => Credential::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            None => Credential::Bearer(auth.to_string()),
        };
        Self::build(url, credential)
    }

    /// Client for the Grafana Cloud API, authenticated with an access policy token
    pub fn cloud(api_url: &str, token: &str) -> Result<Self> {
        Self::build(api_url, Credential::Bearer(token.to_string()))
    }

    fn build(url: &str, credential: Credential) -> Result<Self> {
        let mut base_url = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("grafana-generate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                credential,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an API path (with or without a leading `/`) against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, ListerError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Authenticated GET decoding a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ListerError> {
        let url = self.endpoint(path)?;
        let request = self.inner.http.get(url).query(query);
        let request = match &self.inner.credential {
            Credential::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credential::Bearer(token) => request.bearer_auth(token),
        };

        tracing::trace!(path, "GET");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("GET {} returned status {}: {}", path, status, body.trim()).into());
        }

        Ok(response.json::<T>().await?)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match self.inner.credential {
            Credential::Basic { .. } => "basic",
            Credential::Bearer(_) => "bearer",
        };
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("auth", &auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grafana_client_basic_auth() {
        let client = Client::grafana("http://localhost:3000", "admin:secret").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3000/");
        assert!(format!("{:?}", client).contains("basic"));
        assert!(!format!("{:?}", client).contains("secret"));
    }

    #[test]
    fn test_grafana_client_token_auth() {
        let client = Client::grafana("https://grafana.example.com", "glsa_token").unwrap();
        assert!(format!("{:?}", client).contains("bearer"));
    }

    #[test]
    fn test_endpoint_keeps_sub_path() {
        let client = Client::grafana("https://example.com/grafana", "token").unwrap();
        assert_eq!(
            client.endpoint("/api/folders").unwrap().as_str(),
            "https://example.com/grafana/api/folders"
        );
        assert_eq!(
            client.endpoint("api/search").unwrap().as_str(),
            "https://example.com/grafana/api/search"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(Client::grafana("not a url", "token").is_err());
        assert!(Client::cloud("::", "token").is_err());
    }
}
