use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::api::api_types::{ApiDetailResponse, ApiListResponse};
use crate::api::types::Record;
use crate::config::ApiConfig;
use crate::error::NetworkError;

/// Read-only access to the paginated remote collection.
///
/// No retries happen at this layer; callers decide what to do with a failure.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Fetch one page of basic records.
  async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<Record>, NetworkError>;

  /// Fetch the detailed record for a single id.
  async fn fetch_detail(&self, id: u32) -> Result<Record, NetworkError>;
}

/// HTTP client for the public Pokemon API.
#[derive(Clone)]
pub struct PokeApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl PokeApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self, NetworkError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .default_headers(headers)
      .build()
      .map_err(|e| NetworkError::InvalidRequest(format!("failed to build http client: {}", e)))?;

    // Reject malformed base URLs at construction
    Url::parse(&config.base_url)
      .map_err(|e| NetworkError::InvalidRequest(format!("bad base url '{}': {}", config.base_url, e)))?;

    Ok(Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
    })
  }

  fn list_url(&self, offset: u32, limit: u32) -> Result<Url, NetworkError> {
    let mut url = self.endpoint("pokemon")?;
    url
      .query_pairs_mut()
      .append_pair("offset", &offset.to_string())
      .append_pair("limit", &limit.to_string());
    Ok(url)
  }

  fn detail_url(&self, id: u32) -> Result<Url, NetworkError> {
    self.endpoint(&format!("pokemon/{}", id))
  }

  /// Canonical URL stored on detailed records.
  fn source_url(&self, id: u32) -> String {
    format!("{}/pokemon/{}/", self.base_url, id)
  }

  fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
    let raw = format!("{}/{}", self.base_url, path);
    Url::parse(&raw).map_err(|e| NetworkError::InvalidRequest(format!("{}: {}", raw, e)))
  }

  /// GET a URL and decode the JSON body.
  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, NetworkError> {
    debug!(%url, "GET");

    let response = self.http.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
      warn!(%url, status = status.as_u16(), "request failed");
      return Err(NetworkError::ServerStatus(status.as_u16()));
    }

    let body = response.bytes().await?;
    if body.is_empty() {
      return Err(NetworkError::Empty);
    }

    serde_json::from_slice(&body).map_err(|e| NetworkError::Decode(e.to_string()))
  }
}

#[async_trait]
impl RemoteSource for PokeApiClient {
  async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<Record>, NetworkError> {
    let url = self.list_url(offset, limit)?;
    let response: ApiListResponse = self.get_json(url).await?;

    debug!(
      offset,
      limit,
      total = response.count,
      received = response.results.len(),
      last_page = response.next.is_none(),
      "fetched page"
    );

    response.into_basic_records()
  }

  async fn fetch_detail(&self, id: u32) -> Result<Record, NetworkError> {
    let url = self.detail_url(id)?;
    let response: ApiDetailResponse = self.get_json(url).await?;
    Ok(response.into_record(self.source_url(id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client_for(server: &MockServer) -> PokeApiClient {
    PokeApiClient::new(&ApiConfig {
      base_url: server.uri(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  fn detail_body(id: u32, name: &str) -> serde_json::Value {
    serde_json::json!({
      "id": id,
      "name": name,
      "height": 7,
      "weight": 69,
      "types": [{"slot": 1, "type": {"name": "grass", "url": "x"}}],
      "abilities": [{"ability": {"name": "overgrow", "url": "x"}, "is_hidden": false, "slot": 1}],
      "stats": [{"base_stat": 45, "effort": 0, "stat": {"name": "hp", "url": "x"}}],
      "sprites": {"front_default": null, "front_shiny": null},
      "cries": {"latest": "https://cries/1.ogg", "legacy": null}
    })
  }

  #[tokio::test]
  async fn test_fetch_page_sends_offset_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon"))
      .and(query_param("offset", "5"))
      .and(query_param("limit", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "count": 1302,
        "next": null,
        "previous": null,
        "results": [
          {"name": "charmeleon", "url": format!("{}/pokemon/5/", server.uri())},
          {"name": "charizard", "url": format!("{}/pokemon/6/", server.uri())}
        ]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let records = client_for(&server).fetch_page(5, 2).await.unwrap();

    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![5, 6]);
    assert_eq!(records[0].name, "charmeleon");
  }

  #[tokio::test]
  async fn test_fetch_detail_decodes_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(detail_body(1, "bulbasaur")))
      .mount(&server)
      .await;

    let client = client_for(&server);
    let record = client.fetch_detail(1).await.unwrap();

    assert_eq!(record.name, "bulbasaur");
    assert_eq!(record.source_url, format!("{}/pokemon/1/", server.uri()));
    let details = record.details.unwrap();
    assert_eq!(details.height, 7);
    assert_eq!(details.audio_url.as_deref(), Some("https://cries/1.ogg"));
  }

  #[tokio::test]
  async fn test_non_success_status_is_server_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/9999"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let err = client_for(&server).fetch_detail(9999).await.unwrap_err();
    assert_eq!(err, NetworkError::ServerStatus(404));
  }

  #[tokio::test]
  async fn test_empty_body_is_empty_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(ResponseTemplate::new(200))
      .mount(&server)
      .await;

    let err = client_for(&server).fetch_detail(1).await.unwrap_err();
    assert_eq!(err, NetworkError::Empty);
  }

  #[tokio::test]
  async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon"))
      .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\": 3}"))
      .mount(&server)
      .await;

    let err = client_for(&server).fetch_page(0, 5).await.unwrap_err();
    assert!(matches!(err, NetworkError::Decode(_)));
  }

  #[tokio::test]
  async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(detail_body(1, "bulbasaur"))
          .set_delay(Duration::from_secs(3)),
      )
      .mount(&server)
      .await;

    let client = PokeApiClient::new(&ApiConfig {
      base_url: server.uri(),
      timeout_secs: 1,
    })
    .unwrap();

    let err = client.fetch_detail(1).await.unwrap_err();
    assert_eq!(err, NetworkError::Timeout);
  }

  #[test]
  fn test_invalid_base_url_is_rejected() {
    let result = PokeApiClient::new(&ApiConfig {
      base_url: "not a url".to_string(),
      timeout_secs: 5,
    });
    assert!(matches!(result, Err(NetworkError::InvalidRequest(_))));
  }
}
