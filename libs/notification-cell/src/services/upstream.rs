use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const USER_AGENT: &str = "MomCare/1.0 (+https://mohfw.gov.in)";

static HTTP_CLIENT: LazyLock<Result<Client, String>> = LazyLock::new(|| {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|e| e.to_string())
});

/// HTTP client for third-party sources: hard timeout, no caching.
/// Connections are pooled across instances.
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    timeout_ms: u64,
}

impl UpstreamClient {
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let http_client = HTTP_CLIENT
            .as_ref()
            .map_err(|e| anyhow!("building upstream HTTP client: {}", e))?
            .clone();

        Ok(Self { http_client, timeout_ms })
    }

    async fn send(&self, method: Method, url: &str) -> Result<Response> {
        debug!("Upstream {} {}", method, url);
        self.http_client
            .request(method, url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request timed out after {}ms", self.timeout_ms)
                } else {
                    anyhow!(e)
                }
            })
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(Method::GET, url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Request failed ({})", status.as_u16()));
        }
        Ok(response.json().await?)
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.send(Method::GET, url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Request failed ({})", status.as_u16()));
        }
        Ok(response.text().await?)
    }

    /// `Last-Modified` of `url` from a HEAD request, falling back to GET.
    pub async fn last_modified(&self, url: &str) -> Option<DateTime<Utc>> {
        for method in [Method::HEAD, Method::GET] {
            match self.send(method.clone(), url).await {
                Ok(response) => {
                    if let Some(date) = last_modified_header(&response) {
                        return Some(date);
                    }
                }
                Err(e) => debug!("{} {} failed: {}", method, url, e),
            }
        }
        None
    }
}

fn last_modified_header(response: &Response) -> Option<DateTime<Utc>> {
    let raw = response.headers().get(header::LAST_MODIFIED)?.to_str().ok()?;
    parse_http_date(raw)
}

pub fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
