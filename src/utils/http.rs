// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// GET a URL and decode the body as JSON.
///
/// Connection failures and non-success statuses both surface as transport
/// errors carrying the URL.
pub async fn fetch_json(client: &reqwest::Client, url: Url) -> Result<Value> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| AppError::transport(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Status {
            url: url.to_string(),
            status,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AppError::transport(url.as_str(), e))
}
