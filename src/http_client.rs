use anyhow::{Context, Result};
use reqwest::{Client, Request, Response};
use std::time::Duration;

use crate::error::ApiError;

/// Shared outbound HTTP client for the book API and the identity provider.
///
/// Requests are sent exactly once. Callers inspect the status themselves;
/// only transport failures become errors here.
pub struct HttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(max_connections: usize, connect_timeout: u64, request_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Execute a request without retries
    pub async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(
            method = %method,
            url = %url,
            "Sending HTTP request"
        );

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    tracing::debug!(status = %status, "Request successful");
                } else {
                    tracing::warn!(
                        status = %status,
                        method = %method,
                        url = %url,
                        "Received error response"
                    );
                }
                Ok(response)
            }
            Err(e) => {
                let error_kind = error_kind(&e);

                tracing::error!(
                    error_kind = error_kind,
                    error = %e,
                    url = %url,
                    "HTTP request failed"
                );

                Err(ApiError::RemoteCallFailure {
                    status: 0,
                    message: format!("Could not connect to the server ({})", error_kind),
                })
            }
        }
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Categorize a transport error for logs
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}
