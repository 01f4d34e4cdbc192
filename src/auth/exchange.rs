// Authorization-code exchange against the provider's token endpoint

use super::types::{ProviderConfig, TokenResponse};
use crate::error::ApiError;
use crate::http_client::HttpClient;

/// Trade an authorization code for tokens. One attempt, no retry.
pub async fn exchange_code(
    http: &HttpClient,
    provider: &ProviderConfig,
    code: &str,
) -> Result<TokenResponse, ApiError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ApiError::ValidationError(
            "No authorization code received".to_string(),
        ));
    }

    let url = provider.token_endpoint();
    tracing::debug!(
        "Token exchange request: url={}, client_id={}...",
        url,
        &provider.client_id[..8.min(provider.client_id.len())]
    );

    // The token endpoint takes form-urlencoded data
    let form = [
        ("grant_type", "authorization_code"),
        ("client_id", provider.client_id.as_str()),
        ("code", code),
        ("redirect_uri", provider.redirect_uri.as_str()),
    ];

    let request = http
        .client()
        .post(&url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .form(&form)
        .build()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to build request: {}", e)))?;

    let response = http.execute(request).await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            "Token exchange failed: status={}, body={}",
            status,
            error_text
        );

        // Surface the provider's own description when it sends one
        let message = serde_json::from_str::<serde_json::Value>(&error_text)
            .ok()
            .and_then(|json| {
                json.get("error_description")
                    .or_else(|| json.get("error"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("Token exchange failed (status: {})", status.as_u16()));

        return Err(ApiError::AuthProviderError(message));
    }

    let data: TokenResponse = response.json().await.map_err(|e| {
        ApiError::AuthProviderError(format!("Failed to parse token response: {}", e))
    })?;

    if data.access_token.is_empty() {
        return Err(ApiError::AuthProviderError(
            "Token response does not contain access_token".to_string(),
        ));
    }

    tracing::info!(
        "Authorization code exchanged, expires in {}s",
        data.expires_in.unwrap_or_default()
    );

    Ok(data)
}
