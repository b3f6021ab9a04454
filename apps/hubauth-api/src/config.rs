//! Application configuration loaded from environment variables.
//!
//! Loading is fail-fast: required variables must be present and valid or
//! startup aborts with a clear message.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use hubauth_service::OAuth2Config;
use hubauth_store::StoreConfig;

/// Configuration errors raised during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Kafka settings, present only when `KAFKA_BOOTSTRAP_SERVERS` is set.
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub bootstrap_servers: String,
    pub client_id: String,
    pub topic: String,
}

/// Settings of the API process.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Socket the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Record store connection settings.
    pub store: StoreConfig,

    /// Bearer-token claim naming the acting owner.
    pub owner_claim: String,

    /// External identity-provider settings.
    pub oauth: OAuth2Config,

    /// Lifetime of an outstanding CSRF token in the redirect flow.
    pub csrf_ttl: Duration,

    /// Event broker settings; `None` disables publishing.
    pub kafka: Option<KafkaSettings>,
}

impl ApiConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Required Variables
    ///
    /// - `MONGODB_URI` - MongoDB connection string
    /// - `OAUTH_CLIENT_ID` / `OAUTH_CLIENT_SECRET`
    /// - `OAUTH_AUTH_URL` / `OAUTH_TOKEN_URL` / `OAUTH_REDIRECT_URL`
    ///
    /// # Optional Variables
    ///
    /// - `LISTEN_ADDR` - bind address (default: "0.0.0.0:9085")
    /// - `MONGODB_DATABASE` - database name (default: "deviceauth")
    /// - `OWNER_CLAIM` - owner claim name (default: "sub")
    /// - `OAUTH_SCOPES` - space-separated scopes (default: "openid offline_access")
    /// - `CSRF_TOKEN_TTL_SECS` - redirect-flow token lifetime (default: 300)
    /// - `KAFKA_BOOTSTRAP_SERVERS` / `KAFKA_CLIENT_ID` / `KAFKA_TOPIC`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|var| env::var(var).ok())
    }

    /// Load configuration through the given variable lookup.
    pub fn from_reader(read: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &str| -> Result<String, ConfigError> {
            read(var)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingVar(var.to_string()))
        };

        let listen_addr = read("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:9085".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                var: "LISTEN_ADDR".to_string(),
                message: format!("{e}"),
            })?;

        let store = StoreConfig {
            uri: required("MONGODB_URI")?,
            database: read("MONGODB_DATABASE").unwrap_or_else(|| "deviceauth".to_string()),
        };

        let owner_claim = read("OWNER_CLAIM").unwrap_or_else(|| "sub".to_string());

        let oauth = OAuth2Config {
            client_id: required("OAUTH_CLIENT_ID")?,
            client_secret: required("OAUTH_CLIENT_SECRET")?,
            auth_url: required("OAUTH_AUTH_URL")?,
            token_url: required("OAUTH_TOKEN_URL")?,
            redirect_url: required("OAUTH_REDIRECT_URL")?,
            scopes: read("OAUTH_SCOPES")
                .unwrap_or_else(|| "openid offline_access".to_string())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            owner_claim: owner_claim.clone(),
        };

        let csrf_ttl_secs: u64 = read("CSRF_TOKEN_TTL_SECS")
            .unwrap_or_else(|| "300".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                var: "CSRF_TOKEN_TTL_SECS".to_string(),
                message: format!("{e}"),
            })?;
        if csrf_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CSRF_TOKEN_TTL_SECS".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }

        let kafka = read("KAFKA_BOOTSTRAP_SERVERS")
            .filter(|v| !v.is_empty())
            .map(|bootstrap_servers| KafkaSettings {
                bootstrap_servers,
                client_id: read("KAFKA_CLIENT_ID").unwrap_or_else(|| "hubauth-api".to_string()),
                topic: read("KAFKA_TOPIC").unwrap_or_else(|| "hubauth.events".to_string()),
            });

        Ok(Self {
            listen_addr,
            store,
            owner_claim,
            oauth,
            csrf_ttl: Duration::from_secs(csrf_ttl_secs),
            kafka,
        })
    }
}
