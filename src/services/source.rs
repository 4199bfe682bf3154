// src/services/source.rs

//! Access to the remote content API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, Section};
use crate::utils::http::{create_async_client, fetch_json};

/// Raw read access to the paginated content API.
///
/// Responses are returned undecoded; turning them into typed records is the
/// extractor's job.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch one page of a section listing.
    async fn list_page(&self, section: Section, page: u32, per_page: u32) -> Result<Value>;

    /// Fetch the detail record of a single item.
    async fn detail(&self, identifier: &str) -> Result<Value>;
}

#[async_trait]
impl<T: ContentSource + ?Sized> ContentSource for Arc<T> {
    async fn list_page(&self, section: Section, page: u32, per_page: u32) -> Result<Value> {
        (**self).list_page(section, page, per_page).await
    }

    async fn detail(&self, identifier: &str) -> Result<Value> {
        (**self).detail(identifier).await
    }
}

/// [`ContentSource`] backed by the live HTTP API.
///
/// Endpoints, relative to `base_url`:
/// - `GET /list/{section}?page={n}&perPage={count}`
/// - `GET /detail/{identifier}`
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    /// Build a source from crawler settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Ok(Self::with_client(client, config.base_url()?))
    }

    /// Build a source around an existing client.
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::config(format!("base URL {} cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn list_page(&self, section: Section, page: u32, per_page: u32) -> Result<Value> {
        let mut url = self.endpoint(&["list", section.as_str()])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("perPage", &per_page.to_string());

        log::debug!("GET {url}");
        fetch_json(&self.client, url).await
    }

    async fn detail(&self, identifier: &str) -> Result<Value> {
        let url = self.endpoint(&["detail", identifier])?;

        log::debug!("GET {url}");
        fetch_json(&self.client, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> HttpSource {
        let config = CrawlerConfig {
            base_url: server.uri(),
            ..CrawlerConfig::default()
        };
        HttpSource::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let source = HttpSource::with_client(
            Client::new(),
            Url::parse("https://api.example.com/v1/").unwrap(),
        );
        let url = source.endpoint(&["detail", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/detail/a%2Fb");
    }

    #[tokio::test]
    async fn test_list_page_sends_paging_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/trending"))
            .and(query_param("page", "3"))
            .and(query_param("perPage", "50"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"identifier": "x1"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = source_for(&server)
            .list_page(Section::Trending, 3, 50)
            .await
            .unwrap();
        assert_eq!(body["data"][0]["identifier"], "x1");
    }

    #[tokio::test]
    async fn test_detail_returns_raw_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detail/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"identifier": "abc", "id": 9})),
            )
            .mount(&server)
            .await;

        let body = source_for(&server).detail("abc").await.unwrap();
        assert_eq!(body["id"], 9);
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detail/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = source_for(&server).detail("gone").await.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, AppError::Status { status, .. } if status.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let source = HttpSource::with_client(
            Client::new(),
            Url::parse("http://127.0.0.1:1/").unwrap(),
        );

        let err = source.detail("abc").await.unwrap_err();
        assert!(matches!(err, AppError::Transport { .. }));
    }
}
