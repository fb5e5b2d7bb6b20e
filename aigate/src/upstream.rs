//! Client for the hosted inference API.

use bytes::Bytes;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::UpstreamConfig;
use crate::errors::{Error, Result};
use crate::operations::UpstreamRequest;

/// A fully-buffered 2xx response from the inference API.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::error!("Failed to parse inference API response as JSON: {}", e);
            Error::Other(anyhow::anyhow!("error decoding inference API response body: {}", e))
        })
    }
}

/// Sends inference requests with bearer-token auth.
///
/// Every call is a single POST to `<base url><endpoint>`; there are no retries and no timeout.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl UpstreamClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    pub fn from_config(client: Client, config: &UpstreamConfig) -> Result<Self> {
        let base_url = config.resolved_base_url()?;
        let api_token = config.api_token.clone().ok_or_else(|| Error::InvalidConfig {
            message: "No API token configured".to_string(),
        })?;
        Ok(Self::new(client, base_url, api_token))
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    #[instrument(skip_all, fields(kind = %request.kind, endpoint = %request.endpoint))]
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse> {
        let url = self.url_for(&request.endpoint);
        let content_type = request.content_type();
        let body = request.body.into_bytes()?;
        debug!("POST {} ({} bytes, {})", url, body.len(), content_type);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status,
                status_text: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
                body,
            });
        }

        let body = response.bytes().await?;
        debug!("Inference API returned {} ({} bytes)", status, body.len());

        Ok(UpstreamResponse { body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use crate::operations::{OperationKind, UpstreamBody};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> UpstreamClient {
        UpstreamClient::new(Client::new(), format!("{}/ai/run", server.uri()), "test-token")
    }

    fn summarize_request() -> UpstreamRequest {
        UpstreamRequest {
            kind: OperationKind::Summarize,
            endpoint: "/@cf/facebook/bart-large-cnn".to_string(),
            body: UpstreamBody::Json(json!({"input_text": "x", "max_length": 1024})),
        }
    }

    #[tokio::test]
    async fn test_sends_bearer_token_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/run/@cf/facebook/bart-large-cnn"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"input_text": "x", "max_length": 1024})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"summary": "ok"}})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).send(summarize_request()).await.unwrap();
        let parsed: serde_json::Value = response.json().unwrap();
        assert_eq!(parsed["result"]["summary"], "ok");
    }

    #[tokio::test]
    async fn test_binary_body_is_octet_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/run/@cf/microsoft/resnet-50"))
            .and(header("content-type", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .expect(1)
            .mount(&server)
            .await;

        let request = UpstreamRequest {
            kind: OperationKind::Classify,
            endpoint: "/@cf/microsoft/resnet-50".to_string(),
            body: UpstreamBody::Binary(Bytes::from_static(b"\x89PNG")),
        };
        let response = client_for(&server).send(request).await.unwrap();
        assert_eq!(&response.body[..], br#"{"result":[]}"#);
        let received = &server.received_requests().await.unwrap()[0];
        assert_eq!(received.body, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        match client_for(&server).send(summarize_request()).await {
            Err(Error::Upstream { status, status_text, body }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(status_text, "Service Unavailable");
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let client = UpstreamClient::new(Client::new(), "http://127.0.0.1:9", "test-token");
        let result = client.send(summarize_request()).await;
        assert!(matches!(result, Err(Error::Network { .. })));
    }

    #[test]
    fn test_from_config_substitutes_account() {
        let config = UpstreamConfig {
            account_id: Some("acct42".to_string()),
            api_token: Some("t".to_string()),
            ..Default::default()
        };
        let client = UpstreamClient::from_config(Client::new(), &config).unwrap();
        assert_eq!(
            client.url_for("/@cf/microsoft/resnet-50"),
            "https://api.cloudflare.com/client/v4/accounts/acct42/ai/run/@cf/microsoft/resnet-50"
        );
    }

    #[test]
    fn test_invalid_json_body_is_internal_error() {
        let response = UpstreamResponse {
            body: Bytes::from_static(b"\x89PNG"),
        };
        let parsed: Result<serde_json::Value> = response.json();
        assert!(matches!(parsed, Err(Error::Other(_))));
    }
}
