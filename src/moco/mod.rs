//! Thin HTTP boundary towards MOCO. [MocoTransport] only moves bytes and status codes; deciding
//! what a status or a body means is up to the catalog and booking modules.

pub mod client;
pub mod endpoint;
pub mod entities;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

/// Status and body of a response, whatever the status was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (DNS, TLS, connection reset, ...).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Authenticated requests against the MOCO API. Every request carries
/// `Authorization: Token token={api_key}`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MocoTransport: Send + Sync {
    async fn get(&self, url: Url, api_key: &str) -> Result<RawResponse, TransportError>;

    async fn post_json(
        &self,
        url: Url,
        api_key: &str,
        body: serde_json::Value,
    ) -> Result<RawResponse, TransportError>;
}
