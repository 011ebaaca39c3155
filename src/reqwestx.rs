use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use crate::api::{HttpRequest, HttpResponse, Transport};
use crate::error::{Error, Result, TransportError};

const DEFAULT_USER_AGENT: &str = concat!("Algoliasearch/Rust ", env!("CARGO_PKG_VERSION"));

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(Error::HttpClientBuild)?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client, e.g. one configured with a proxy.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(TransportError::ResponseBody)?;
        trace!(
            "{} {} answered {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );

        Ok(HttpResponse { status, body })
    }
}

fn classify_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{HeaderMap, HeaderValue};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::Method;

    fn request(method: Method, url: String) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn send_returns_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/indexes/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(Method::Get, format!("{}/1/indexes/", mock_server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let value: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(value, serde_json::json!({ "items": [] }));
    }

    #[tokio::test]
    async fn send_forwards_headers_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/1/indexes/contacts/settings"))
            .and(header("X-Algolia-API-Key", "secret"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({ "hitsPerPage": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taskID": 1
            })))
            .mount(&mock_server)
            .await;

        let mut req = request(
            Method::Put,
            format!("{}/1/indexes/contacts/settings", mock_server.uri()),
        );
        req.headers
            .insert("x-algolia-api-key", HeaderValue::from_static("secret"));
        req.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        req.body = Some(bytes::Bytes::from_static(br#"{"hitsPerPage":5}"#));

        let response = ReqwestTransport::new().unwrap().send(req).await.unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn send_maps_slow_responses_to_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let mut req = request(Method::Get, format!("{}/1/logs", mock_server.uri()));
        req.timeout = Duration::from_millis(50);

        let err = ReqwestTransport::new()
            .unwrap()
            .send(req)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }

    #[tokio::test]
    async fn send_reports_refused_connections() {
        let req = request(Method::Get, "http://127.0.0.1:1/1/logs".to_string());

        let err = ReqwestTransport::new()
            .unwrap()
            .send(req)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Request(_)
        ));
    }
}
