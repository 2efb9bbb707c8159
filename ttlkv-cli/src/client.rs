//! HTTP client for a running ttlkv server.

use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Outcome of a fetch.
#[derive(Debug, PartialEq)]
pub enum Lookup {
    /// The key is live; carries its value.
    Found(Value),
    /// The key is absent or expired.
    NotFound,
}

/// Server acknowledgement of a store.
#[derive(Debug, Deserialize)]
pub struct SetReceipt {
    pub key: String,
    pub expiration: String,
    pub ttl_ms: u64,
}

/// Thin wrapper over the `/get` and `/set` endpoints.
pub struct CacheClient {
    http: reqwest::Client,
    base_url: String,
}

impl CacheClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Lookup> {
        let url = format!("{}/get", self.base_url);
        debug!(%url, key, "GET");

        let response = self
            .http
            .get(&url)
            .query(&[("key", key)])
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        match response.status() {
            StatusCode::OK => {
                let value = response.json().await.context("Invalid JSON in response")?;
                Ok(Lookup::Found(value))
            }
            StatusCode::NOT_FOUND => Ok(Lookup::NotFound),
            status => Err(server_error(status, response).await),
        }
    }

    pub async fn set(&self, key: &str, value: &Value, expiration: &str) -> Result<SetReceipt> {
        let url = format!("{}/set", self.base_url);
        debug!(%url, key, expiration, "POST");

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "key": key,
                "value": value,
                "expiration": expiration,
            }))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        match response.status() {
            StatusCode::CREATED => response.json().await.context("Invalid JSON in response"),
            status => Err(server_error(status, response).await),
        }
    }
}

async fn server_error(status: StatusCode, response: reqwest::Response) -> anyhow::Error {
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
    anyhow!("Server returned {}: {}", status, message)
}

/// Interprets a command-line value as JSON, or as a plain string if it
/// is not valid JSON.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
