//! Remote data provider access
//!
//! This module provides the fetch seam between refresh brokers and the
//! provider's REST API. The trait is object-safe and returns the raw response
//! body; typed JSON decoding is layered on top in [`fetch_payload`] so tests
//! can substitute scripted fetchers without touching the network.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Credentials;
use crate::endpoint::EndpointDescriptor;

/// Errors that can occur when fetching data from the provider
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body is not the expected JSON shape
    #[error("Failed to parse provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetches raw response bodies from provider endpoints
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetches the body at the described endpoint
    ///
    /// # Arguments
    /// * `endpoint` - The endpoint to request
    ///
    /// # Returns
    /// * `Ok(String)` - The raw response body
    /// * `Err(FetchError)` - If the request fails or the status is non-success
    async fn fetch(&self, endpoint: &EndpointDescriptor) -> Result<String, FetchError>;
}

/// Fetches an endpoint and decodes the JSON body into the expected payload type
pub async fn fetch_payload<P: DeserializeOwned>(
    fetcher: &dyn RemoteFetcher,
    endpoint: &EndpointDescriptor,
) -> Result<P, FetchError> {
    let body = fetcher.fetch(endpoint).await?;
    let payload = serde_json::from_str(&body)?;
    Ok(payload)
}

/// HTTP implementation of [`RemoteFetcher`] backed by reqwest
#[derive(Debug, Clone)]
pub struct RestFetcher {
    client: Client,
    credentials: Option<Credentials>,
}

impl Default for RestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RestFetcher {
    /// Creates a fetcher with a default HTTP client and no credentials
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            credentials: None,
        }
    }

    /// Creates a fetcher with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            credentials: None,
        }
    }

    /// Attaches basic-auth credentials sent with every request
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

#[async_trait]
impl RemoteFetcher for RestFetcher {
    async fn fetch(&self, endpoint: &EndpointDescriptor) -> Result<String, FetchError> {
        let url = endpoint.url();

        let mut request = self.client.get(&url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        Ok(text)
    }
}
