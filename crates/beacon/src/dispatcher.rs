use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

pub const REQUEST_CONTENT_TYPE: &str = "application/json";

/// Raw request layer owned by every dialect adapter. Implementations know nothing about
/// response shapes; they return the body of a 2xx response or a [`TransportError`].
#[async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait RequestDispatcher: Send + Sync {
    async fn get(&self, path: &str) -> Result<Bytes, TransportError>;

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Bytes, TransportError>;

    fn provider_url(&self) -> &Url;
}

/// Serializes `body` and posts it through `dispatcher`.
pub async fn post<D: RequestDispatcher + ?Sized, T: Serialize + ?Sized>(
    dispatcher: &D,
    path: &str,
    body: &T,
) -> Result<Bytes, TransportError> {
    let value = serde_json::to_value(body).map_err(TransportError::Encode)?;
    dispatcher.post_json(path, &value).await
}

#[derive(Clone, Debug)]
pub struct HttpDispatcher {
    pub http: reqwest::Client,
    pub endpoint: Url,
}

impl HttpDispatcher {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn from_endpoint_str(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self::new(reqwest::Client::new(), endpoint))
    }

    /// `provider_url + path`, the provider's own path prefix is kept.
    pub fn target(&self, path: &str) -> Result<Url, TransportError> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn read_body(response: reqwest::Response) -> Result<Bytes, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl RequestDispatcher for HttpDispatcher {
    async fn get(&self, path: &str) -> Result<Bytes, TransportError> {
        let target = self.target(path)?;
        debug!(%target, "GET");
        let response = self.http.get(target).send().await?;
        Self::read_body(response).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Bytes, TransportError> {
        let target = self.target(path)?;
        debug!(%target, "POST");
        let body = serde_json::to_vec(body).map_err(TransportError::Encode)?;
        let response = self
            .http
            .post(target)
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        Self::read_body(response).await
    }

    fn provider_url(&self) -> &Url {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_target_keeps_provider_path() {
        let dispatcher = HttpDispatcher::from_endpoint_str("http://localhost:5052/").unwrap();
        assert_eq!(dispatcher.target("/spec").unwrap().as_str(), "http://localhost:5052/spec");

        let dispatcher =
            HttpDispatcher::from_endpoint_str("http://localhost:5052/node/v1").unwrap();
        assert_eq!(
            dispatcher.target("/spec/slots_per_epoch").unwrap().as_str(),
            "http://localhost:5052/node/v1/spec/slots_per_epoch"
        );
    }

    #[tokio::test]
    async fn test_get_ok() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/spec/slots_per_epoch")
            .with_status(200)
            .with_body("32")
            .create_async()
            .await;

        let dispatcher = HttpDispatcher::from_endpoint_str(&server.url()).unwrap();
        let body = dispatcher.get("/spec/slots_per_epoch").await.unwrap();

        assert_eq!(body.as_ref(), b"32");
    }

    #[tokio::test]
    async fn test_get_non_2xx_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/beacon/head")
            .with_status(503)
            .with_body("syncing")
            .create_async()
            .await;

        let dispatcher = HttpDispatcher::from_endpoint_str(&server.url()).unwrap();
        let err = dispatcher.get("/beacon/head").await.unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "syncing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_post_sets_content_type_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/beacon/validators")
            .match_header("content-type", REQUEST_CONTENT_TYPE)
            .match_body(Matcher::Json(json!({"pubkeys": ["0xabcd"]})))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let dispatcher = HttpDispatcher::from_endpoint_str(&server.url()).unwrap();
        let body = post(&dispatcher, "/beacon/validators", &json!({"pubkeys": ["0xabcd"]}))
            .await
            .unwrap();

        assert_eq!(body.as_ref(), b"[]");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let dispatcher = HttpDispatcher::from_endpoint_str("http://127.0.0.1:1").unwrap();
        let err = dispatcher.get("/spec").await.unwrap_err();
        assert!(matches!(err, TransportError::ReqwestError(_)));
        assert!(err.is_retryable());
    }
}
