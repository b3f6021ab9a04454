//! The token-provider capability and its generic OAuth2 implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::owner::{parse_owner_claim, ClaimError};

/// Token material returned by the identity provider.
#[derive(Debug, Clone)]
pub struct ProviderToken {
    pub access_token: String,
    pub refresh_token: String,
    /// `None` for tokens without an expiration.
    pub expiry: Option<DateTime<Utc>>,
    /// Account identity the token was issued for; may be empty when the
    /// provider response does not carry the owner claim.
    pub owner: String,
}

/// Identity-provider exchange errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("token endpoint rejected the request: HTTP {status}")]
    Rejected { status: u16 },

    #[error("token endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot resolve token owner: {0}")]
    Owner(#[from] ClaimError),
}

/// OAuth exchange with an external identity provider.
///
/// Injected into the lifecycle service so it stays free of wire-protocol
/// detail; any concrete identity-provider integration satisfies this.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Exchange a one-time authorization code for a token.
    async fn exchange(&self, auth_code: &str) -> Result<ProviderToken, ProviderError>;

    /// Obtain a fresh token from a stored refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<ProviderToken, ProviderError>;

    /// Authorization URL initiating the redirect flow, correlated by the
    /// given CSRF token.
    fn auth_code_url(&self, csrf_token: &str) -> String;
}

/// Settings for the generic OAuth2 provider.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    /// Authorization endpoint the redirect flow sends users to.
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    /// Claim of the access token naming the token's owner.
    pub owner_claim: String,
}

/// Wire shape of an RFC 6749 token response.
#[derive(Debug, Deserialize)]
struct WireTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Generic OAuth2 token provider speaking the standard code-exchange and
/// refresh grants.
#[derive(Clone)]
pub struct OAuth2Provider {
    config: OAuth2Config,
    http_client: reqwest::Client,
}

impl OAuth2Provider {
    pub fn new(config: OAuth2Config) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<WireTokenResponse, ProviderError> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    fn expiry_from(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
        expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

#[async_trait]
impl TokenProvider for OAuth2Provider {
    async fn exchange(&self, auth_code: &str) -> Result<ProviderToken, ProviderError> {
        let wire = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", auth_code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_url),
            ])
            .await?;

        // A sign-up must know who the token belongs to.
        let owner = parse_owner_claim(&self.config.owner_claim, &wire.access_token)?;

        Ok(ProviderToken {
            owner,
            expiry: Self::expiry_from(wire.expires_in),
            access_token: wire.access_token,
            refresh_token: wire.refresh_token.unwrap_or_default(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderToken, ProviderError> {
        let wire = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
            ])
            .await?;

        // The refresh response may not carry the owner claim; the caller
        // falls back to the owner it already knows.
        let owner = match parse_owner_claim(&self.config.owner_claim, &wire.access_token) {
            Ok(owner) => owner,
            Err(err) => {
                debug!(error = %err, "refreshed token carries no owner claim");
                String::new()
            }
        };

        Ok(ProviderToken {
            owner,
            expiry: Self::expiry_from(wire.expires_in),
            access_token: wire.access_token,
            refresh_token: wire.refresh_token.unwrap_or_default(),
        })
    }

    fn auth_code_url(&self, csrf_token: &str) -> String {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", csrf_token),
        ];
        match Url::parse_with_params(&self.config.auth_url, params) {
            Ok(url) => url.to_string(),
            // A malformed configured URL is caught at startup by config
            // validation; fall back to the bare endpoint.
            Err(_) => self.config.auth_url.clone(),
        }
    }
}
