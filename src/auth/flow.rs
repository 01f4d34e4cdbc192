// Sign-in flow
//
// One flow type serves both credentials. A flow sends the browser to the
// provider, then turns the callback into a stored credential or an error.
//
//   Idle --code--> Authenticating --store--> Complete (navigate to target)
//   Idle --error--> Error
//   Idle --nothing, no credential--> navigate to fallback

use std::time::Duration;

use reqwest::Url;

use super::types::{CallbackParams, ProviderConfig};
use crate::config::Config;
use crate::credentials::{CredentialName, CredentialStore};
use crate::error::ApiError;
use crate::gate::{ADD_BOOK_PATH, HOME_PATH, LOGIN_PATH};

/// Shown when the provider reports an error without a description
const DEFAULT_ERROR_MESSAGE: &str = "Authentication failed";

/// Error code reported when the received code could not be stored
const UNSTORABLE_CODE_ERROR: &str = "invalid_code";

/// Terminal result of handling one callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No callback parameters; the credential is already held
    Idle,
    /// Credential stored. `location` carries no callback parameters.
    Complete { location: String },
    /// The provider refused the sign-in; nothing was stored
    Failed { error: String, message: String },
    /// No code and no credential; the user has to sign in first
    SignInRequired { location: String },
}

/// A sign-in flow bound to one credential
#[derive(Debug, Clone)]
pub struct AuthFlow {
    credential: CredentialName,
    provider: ProviderConfig,
    ttl: Duration,
    target_path: String,
    fallback_path: String,
}

impl AuthFlow {
    pub fn new(
        credential: CredentialName,
        provider: ProviderConfig,
        ttl: Duration,
        target_path: impl Into<String>,
        fallback_path: impl Into<String>,
    ) -> Self {
        Self {
            credential,
            provider,
            ttl,
            target_path: target_path.into(),
            fallback_path: fallback_path.into(),
        }
    }

    /// General sign-in: lands on the home page, retries from the login page
    pub fn primary(config: &Config) -> Self {
        Self::new(
            CredentialName::Primary,
            config.primary_provider.clone(),
            Duration::from_secs(config.primary_ttl),
            HOME_PATH,
            LOGIN_PATH,
        )
    }

    /// Add-book sign-in: lands on the add-book page, falls back to home
    pub fn add_book(config: &Config) -> Self {
        Self::new(
            CredentialName::AddBook,
            config.add_book_provider.clone(),
            Duration::from_secs(config.add_book_ttl),
            ADD_BOOK_PATH,
            HOME_PATH,
        )
    }

    pub fn credential(&self) -> CredentialName {
        self.credential
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Provider login URL carrying this flow's client id, scopes and return address
    pub fn authorize_url(&self) -> Result<Url, ApiError> {
        let scope = self.provider.scopes.join(" ");
        Url::parse_with_params(
            &self.provider.login_endpoint(),
            &[
                ("client_id", self.provider.client_id.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("redirect_uri", self.provider.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid provider URL: {}", e)))
    }

    /// Where to send the browser to begin this flow. Skips the provider when
    /// the credential is already held.
    pub fn start(&self, store: &impl CredentialStore) -> Result<String, ApiError> {
        if store.contains(self.credential) {
            tracing::debug!("{} already present, going to {}", self.credential, self.target_path);
            return Ok(self.target_path.clone());
        }

        let url = self.authorize_url()?;
        tracing::info!("Redirecting to identity provider for {}", self.credential);
        Ok(url.into())
    }

    /// Consume one callback. Writes the credential at most once.
    pub fn handle_callback(
        &self,
        params: &CallbackParams,
        store: &mut impl CredentialStore,
    ) -> CallbackOutcome {
        if let Some(error) = params.error() {
            let message = params
                .error_description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_string();
            tracing::warn!(
                credential = %self.credential,
                error = error,
                "Identity provider returned an error: {}",
                message
            );
            return CallbackOutcome::Failed {
                error: error.to_string(),
                message,
            };
        }

        if let Some(code) = params.code() {
            tracing::debug!(credential = %self.credential, "Authenticating with received code");
            store.set(self.credential, code, self.ttl);
            if store.get(self.credential).as_deref() != Some(code) {
                tracing::warn!(
                    credential = %self.credential,
                    "Authorization code could not be stored"
                );
                return CallbackOutcome::Failed {
                    error: UNSTORABLE_CODE_ERROR.to_string(),
                    message: "The authorization code received could not be stored".to_string(),
                };
            }
            tracing::info!(
                "Auth code received, {} stored for {}s, redirecting to {}",
                self.credential,
                self.ttl.as_secs(),
                self.target_path
            );
            return CallbackOutcome::Complete {
                location: self.target_path.clone(),
            };
        }

        if store.contains(self.credential) {
            return CallbackOutcome::Idle;
        }

        tracing::debug!(
            "No code and no {} present, redirecting to {}",
            self.credential,
            self.fallback_path
        );
        CallbackOutcome::SignInRequired {
            location: self.fallback_path.clone(),
        }
    }
}
