use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, Url};
use tracing::debug;

use super::{MocoTransport, RawResponse, TransportError};

/// [MocoTransport] backed by reqwest. There's no explicit timeout, a hung request fails once the
/// underlying connection does.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mocotray/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        request: RequestBuilder,
        api_key: &str,
    ) -> Result<RawResponse, TransportError> {
        let response = request
            .header(AUTHORIZATION, format!("Token token={api_key}"))
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        debug!(status, bytes = body.len(), "Received response");
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl MocoTransport for ReqwestTransport {
    async fn get(&self, url: Url, api_key: &str) -> Result<RawResponse, TransportError> {
        debug!(%url, "GET");
        self.send(self.client.get(url), api_key).await
    }

    async fn post_json(
        &self,
        url: Url,
        api_key: &str,
        body: serde_json::Value,
    ) -> Result<RawResponse, TransportError> {
        debug!(%url, "POST");
        self.send(self.client.post(url).json(&body), api_key).await
    }
}
