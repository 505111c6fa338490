use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Thin JSON client for one tournament server.
#[derive(Clone)]
pub struct ArenaClient {
    http: Client,
    base_url: Url,
}

impl ArenaClient {
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for {}", path))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_optional(path)
            .await?
            .ok_or_else(|| anyhow!("GET {} returned 404", path))
    }

    /// Like `get`, but a 404 is `Ok(None)` instead of an error.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let endpoint = self.endpoint(path)?;
        debug!("GET {}", endpoint);
        let response = self
            .http
            .get(endpoint)
            .send()
            .await
            .with_context(|| format!("Failed to send GET {}", path))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GET {} failed with status {}: {}", path, status, body));
        }
        let value = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response of GET {}", path))?;
        Ok(Some(value))
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let endpoint = self.endpoint(path)?;
        debug!("POST {}", endpoint);
        let response = self
            .http
            .post(endpoint)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("POST {} failed with status {}: {}", path, status, body));
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response of POST {}", path))
    }
}

pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .ok()
        .filter(|url| url.has_host())
        .map_or_else(|| Url::parse(&format!("http://{raw}")), Ok)
        .context("Invalid base URL")?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        let url = normalize_base_url("localhost:5289").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5289/");
        assert_eq!(url.join("/api/health").unwrap().as_str(), "http://localhost:5289/api/health");

        let url = normalize_base_url("https://arena.example.com").unwrap();
        assert_eq!(url.scheme(), "https");
    }
}
