//! HTTP transport used by the CoinGecko client
//!
//! The client builds [`ApiRequest`]s and interprets [`ApiResponse`]s; the
//! transport only moves bytes. Keeping this behind a trait lets the retry
//! loop be driven by scripted responses in tests.

use crate::{
    config::DashboardConfig,
    constants::{REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ApiError,
    retry::parse_retry_after,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Url};
use std::time::Duration;

/// A GET request relative to the API base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Unencoded path segments, e.g. `["coins", "bitcoin", "market_chart"]`
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a request for a `/`-separated endpoint path
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
        }
    }

    /// Appends one path segment (may contain characters needing encoding)
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Appends one query parameter
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Path as joined segments, without leading slash
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed `Retry-After` header
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl ApiResponse {
    /// Creates a 200 response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request without retrying
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs one GET round trip
    ///
    /// Non-2xx statuses are returned as `Ok`; only failures to obtain a
    /// response at all are errors.
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Creates a transport for the configured tier, base URL and API key
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::InvalidConfig(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidConfig(format!(
                "Base URL {} cannot carry a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ApiError::InvalidConfig(format!("Invalid API key: {}", e)))?;
            headers.insert(HeaderName::from_static(config.tier.header_name()), value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(ApiError::NetworkError)?;

        Ok(Self { client, base_url })
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidConfig("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.build_url(request)?;
        tracing::debug!(path = %request.path(), "Sending upstream request");

        let response = self
            .client
            .get(url)
            .query(&request.query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::NetworkError(e)
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::NetworkError(e)
            }
        })?;

        Ok(ApiResponse {
            status,
            retry_after,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CoinGeckoClient;
    use crate::config::ApiTier;
    use crate::provider::MarketDataProvider;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn http_response(status_line: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            status_line,
            extra_headers,
            body.len(),
            body
        )
    }

    /// Serves one canned response per connection and returns the request heads,
    /// lower-cased
    async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api/v3", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut captured = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                captured.push(String::from_utf8_lossy(&head).to_lowercase());
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            captured
        });

        (base_url, handle)
    }

    fn pro_config(base_url: &str) -> DashboardConfig {
        DashboardConfig {
            tier: ApiTier::Pro,
            api_key: Some("k3y".to_string()),
            ..DashboardConfig::default()
        }
        .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_tier_header_sent_and_retry_after_read() {
        let (base_url, server) = serve(vec![http_response(
            "429 Too Many Requests",
            "Retry-After: 2\r\n",
            "{\"error\":\"rate limited\"}",
        )])
        .await;
        let transport = ReqwestTransport::new(&pro_config(&base_url)).unwrap();

        let response = transport
            .get(&ApiRequest::new("coins/markets").param("ids", "vanry"))
            .await
            .unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(response.retry_after, Some(Duration::from_secs(2)));
        assert!(!response.is_success());

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("get /api/v3/coins/markets?ids=vanry "));
        assert!(requests[0].contains("\r\nx-cg-pro-api-key: k3y\r\n"));
        assert!(!requests[0].contains("x-cg-demo-api-key"));
    }

    #[tokio::test]
    async fn test_demo_tier_header_name() {
        let (base_url, server) = serve(vec![http_response("200 OK", "", "[]")]).await;
        let config = DashboardConfig {
            api_key: Some("demo".to_string()),
            ..DashboardConfig::default()
        }
        .with_base_url(base_url);
        let transport = ReqwestTransport::new(&config).unwrap();

        let response = transport.get(&ApiRequest::new("search")).await.unwrap();
        assert_eq!(response, ApiResponse::ok("[]"));

        let requests = server.await.unwrap();
        assert!(requests[0].contains("\r\nx-cg-demo-api-key: demo\r\n"));
    }

    #[tokio::test]
    async fn test_client_authenticates_over_http() {
        let body = r#"[{"id":"vanar-chain","symbol":"vanry","name":"Vanar Chain"}]"#;
        let (base_url, server) = serve(vec![http_response("200 OK", "", body)]).await;
        let client = CoinGeckoClient::new(&pro_config(&base_url)).unwrap();

        let coins = client.fetch_markets_by_ids("usd", &["vanry"]).await.unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "vanar-chain");

        let requests = server.await.unwrap();
        let request_line = requests[0].lines().next().unwrap();
        assert!(request_line.starts_with("get /api/v3/coins/markets?"));
        assert!(request_line.contains("ids=vanry"));
        assert!(request_line.contains("x_cg_pro_api_key=k3y"));
        assert!(requests[0].contains("\r\nx-cg-pro-api-key: k3y\r\n"));
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new("coins/")
            .segment("bitcoin")
            .segment("market_chart")
            .param("vs_currency", "usd")
            .param("days", 7);

        assert_eq!(request.path(), "coins/bitcoin/market_chart");
        assert_eq!(request.query_value("days"), Some("7"));
        assert_eq!(request.query_value("missing"), None);
    }

    #[test]
    fn test_build_url_encodes_segments() {
        let config = DashboardConfig::default().with_base_url("https://api.example.com/api/v3/");
        let transport = ReqwestTransport::new(&config).unwrap();
        let url = transport
            .build_url(&ApiRequest::new("coins").segment("odd id"))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v3/coins/odd%20id");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = DashboardConfig::default().with_base_url("not a url");
        assert!(matches!(
            ReqwestTransport::new(&config),
            Err(ApiError::InvalidConfig(_))
        ));
    }
}
