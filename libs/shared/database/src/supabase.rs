use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_RANGE, CONTENT_TYPE, AUTHORIZATION},
    Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

const REST_PREFIX: &str = "/rest/v1";
/// Rows requested per page by [`SupabaseClient::select_all`].
pub const PAGE_ROWS: usize = 1000;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

/// PostgREST client for the hosted database. Requests run with the
/// service key; access control happens in the API layer.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DbError> {
        let mut headers = HeaderMap::new();

        let api_key = if self.anon_key.is_empty() { &self.service_key } else { &self.anon_key };
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).map_err(|e| DbError::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.service_key.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.service_key))
                    .map_err(|e| DbError::Config(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where T: DeserializeOwned {
        let text = self.send(method, path, body, extra_headers).await?;
        // DELETE and minimal-return writes answer with an empty body.
        let payload = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(payload)?)
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, DbError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            error!("API error ({}): {}", status, text);
            return Err(classify_error(status, text));
        }

        Ok(response)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<String, DbError> {
        let response = self.dispatch(method, path, body, extra_headers).await?;
        Ok(response.text().await?)
    }

    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.request(Method::GET, path, None).await
    }

    /// Every row matching `path`, paged with `limit`/`offset` so the
    /// server's row cap cannot truncate the result. `path` needs a total
    /// `order` for the pages to line up.
    pub async fn select_all<T>(&self, path: &str) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut rows: Vec<T> = Vec::new();

        loop {
            let page: Vec<T> = self
                .select(&format!("{}{}limit={}&offset={}", path, separator, PAGE_ROWS, rows.len()))
                .await?;
            if page.is_empty() {
                break;
            }
            rows.extend(page);
        }

        Ok(rows)
    }

    /// Exact number of rows matching `path`, read from `Content-Range`.
    pub async fn count(&self, path: &str) -> Result<u64, DbError> {
        let response = self
            .dispatch(Method::HEAD, path, None, Some(prefer("count=exact")))
            .await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(range_total)
            .ok_or_else(|| DbError::Api {
                status: response.status().as_u16(),
                message: format!("no row count for {}", path),
            })
    }

    pub async fn select_one<T>(&self, path: &str) -> Result<Option<T>, DbError>
    where T: DeserializeOwned {
        let rows: Vec<T> = self.select(path).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts one row and returns its stored representation.
    pub async fn insert<T>(&self, table: &str, body: Value) -> Result<T, DbError>
    where T: DeserializeOwned {
        let rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &format!("{}/{}", REST_PREFIX, table),
            Some(body),
            Some(prefer("return=representation")),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::Api { status: 201, message: format!("insert into {} returned no row", table) })
    }

    /// Inserts unless a row with the same `on_conflict` key exists.
    /// Returns `None` when the row was already present.
    pub async fn insert_if_absent<T>(&self, table: &str, on_conflict: &str, body: Value) -> Result<Option<T>, DbError>
    where T: DeserializeOwned {
        let rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &format!("{}/{}?on_conflict={}", REST_PREFIX, table, on_conflict),
            Some(body),
            Some(prefer("resolution=ignore-duplicates,return=representation")),
        ).await?;

        Ok(rows.into_iter().next())
    }

    /// Insert-or-update on `on_conflict`; every column in `body` is written.
    pub async fn upsert<T>(&self, table: &str, on_conflict: &str, body: Value) -> Result<T, DbError>
    where T: DeserializeOwned {
        let rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &format!("{}/{}?on_conflict={}", REST_PREFIX, table, on_conflict),
            Some(body),
            Some(prefer("resolution=merge-duplicates,return=representation")),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::Api { status: 200, message: format!("upsert into {} returned no row", table) })
    }

    /// PATCH every row matched by the filter in `path`, returning the updated rows.
    pub async fn update<T>(&self, path: &str, body: Value) -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(
            Method::PATCH,
            path,
            Some(body),
            Some(prefer("return=representation")),
        ).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), DbError> {
        self.send(Method::DELETE, path, None, Some(prefer("return=minimal"))).await?;
        Ok(())
    }
}

pub fn rest_path(table: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}/{}", REST_PREFIX, table)
    } else {
        format!("{}/{}?{}", REST_PREFIX, table, query)
    }
}

/// Total from a `Content-Range` value such as `0-24/1200` or `*/0`.
fn range_total(range: &str) -> Option<u64> {
    range.rsplit_once('/')?.1.trim().parse().ok()
}

fn prefer(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static(value));
    headers
}

fn classify_error(status: StatusCode, text: String) -> DbError {
    let code = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(String::from));

    match status.as_u16() {
        // 23503 is a foreign key violation, also reported as 409.
        409 if code.as_deref() != Some("23503") => DbError::UniqueViolation(text),
        401 | 403 => DbError::Auth(text),
        404 => DbError::NotFound(text),
        other => DbError::Api { status: other, message: text },
    }
}
