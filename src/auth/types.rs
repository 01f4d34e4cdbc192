// Authentication types

use serde::{Deserialize, Serialize};

/// One sign-in client registered with the identity provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Provider base URL, e.g. `https://example.auth.us-east-1.amazoncognito.com`
    pub auth_url: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    /// Where the provider sends the browser back to
    pub redirect_uri: String,
}

impl ProviderConfig {
    pub fn login_endpoint(&self) -> String {
        format!("{}/login", self.auth_url)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.auth_url)
    }
}

/// Query parameters delivered on the return leg of a sign-in redirect
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Which sign-in client a code was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    #[default]
    Primary,
    AddBook,
}

/// Body of `POST /api/auth/token`
#[derive(Debug, Deserialize)]
pub struct TokenExchangeRequest {
    pub code: String,
    #[serde(default)]
    pub flow: FlowKind,
}

/// Provider response to an authorization-code grant
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_code_is_absent() {
        let params = CallbackParams {
            code: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.code(), None);
    }

    #[test]
    fn test_provider_endpoints() {
        let provider = ProviderConfig {
            auth_url: "https://id.example.com".to_string(),
            client_id: "client".to_string(),
            scopes: vec!["openid".to_string()],
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
        };
        assert_eq!(provider.login_endpoint(), "https://id.example.com/login");
        assert_eq!(provider.token_endpoint(), "https://id.example.com/oauth2/token");
    }

    #[test]
    fn test_exchange_request_defaults_to_primary() {
        let req: TokenExchangeRequest = serde_json::from_str(r#"{"code":"abc"}"#).unwrap();
        assert_eq!(req.flow, FlowKind::Primary);

        let req: TokenExchangeRequest =
            serde_json::from_str(r#"{"code":"abc","flow":"add_book"}"#).unwrap();
        assert_eq!(req.flow, FlowKind::AddBook);
    }
}
