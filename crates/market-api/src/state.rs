//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the document store, payment provider, token issuer and
//! configuration.

use crate::auth::TokenIssuer;
use market_core::{
    normalize_email, BoxedPaymentProvider, MarketError, MarketResult, MemoryStore, Role,
    SharedStore, User,
};
use market_mongo::MongoStore;
use market_stripe::StripePaymentIntents;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Which document store backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(MarketError::Configuration(format!(
                "unknown STORE_BACKEND: {}",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// MongoDB connection string (required for the mongo backend)
    pub mongodb_uri: Option<String>,
    /// Database name
    pub db_name: String,
    /// Bearer token signing key
    pub token_secret: String,
    /// Bearer token lifetime
    pub token_ttl_hours: i64,
    /// Admin seeded into the memory backend at startup
    pub admin_email: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> MarketResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MarketResult<Self> {
        let token_secret = lookup("ACCESS_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| MarketError::Configuration("ACCESS_TOKEN_SECRET not set".to_string()))?;

        let store_backend = lookup("STORE_BACKEND")
            .map(|b| b.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Mongo);

        let mongodb_uri = lookup("MONGODB_URI");
        if store_backend == StoreBackend::Mongo && mongodb_uri.is_none() {
            return Err(MarketError::Configuration("MONGODB_URI not set".to_string()));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(5000),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            store_backend,
            mongodb_uri,
            db_name: lookup("DB_NAME").unwrap_or_else(|| "toolsMarketplace".to_string()),
            token_secret,
            token_ttl_hours: lookup("ACCESS_TOKEN_TTL_HOURS")
                .and_then(|h| h.parse().ok())
                .filter(|h| *h > 0)
                .unwrap_or(24),
            admin_email: lookup("ADMIN_EMAIL")
                .filter(|e| !e.trim().is_empty())
                .map(|e| normalize_email(&e))
                .transpose()?,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> MarketResult<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            MarketError::Configuration(format!(
                "invalid socket address {}:{}: {}",
                self.host, self.port, e
            ))
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Document store
    pub store: SharedStore,
    /// Payment intent provider
    pub payments: BoxedPaymentProvider,
    /// Bearer token issuer/verifier
    pub tokens: TokenIssuer,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from the environment
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let store = connect_store(&config).await?;

        let stripe = StripePaymentIntents::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::from_parts(config, store, Arc::new(stripe)))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: AppConfig,
        store: SharedStore,
        payments: BoxedPaymentProvider,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.token_secret, config.token_ttl_hours);
        Self {
            store,
            payments,
            tokens,
            config,
        }
    }
}

/// Open the configured document store
async fn connect_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    match config.store_backend {
        StoreBackend::Mongo => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("MONGODB_URI not set"))?;
            let store = MongoStore::connect(uri, &config.db_name)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to MongoDB: {}", e))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data is lost on restart");
            let mut store = MemoryStore::new();
            if let Some(email) = &config.admin_email {
                info!("Seeding admin user {}", email);
                store = store.with_user(User::new(email.as_str()).with_role(Role::Admin));
            }
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_SECRET", "s3cret"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.store_backend, StoreBackend::Mongo);
        assert_eq!(config.db_name, "toolsMarketplace");
        assert_eq!(config.token_ttl_hours, 24);
        assert!(!config.is_production());
    }

    #[test]
    fn test_required_settings() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
        // mongo backend needs a URI
        assert!(AppConfig::from_lookup(lookup(&[("ACCESS_TOKEN_SECRET", "s")])).is_err());
        // memory backend does not
        let config = AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("STORE_BACKEND", "memory"),
        ]))
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);

        assert!(AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("STORE_BACKEND", "postgres"),
        ]))
        .is_err());
    }

    #[tokio::test]
    async fn test_admin_email_is_normalized_before_seeding() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("STORE_BACKEND", "memory"),
            ("ADMIN_EMAIL", "  Admin@Tools.test \n"),
        ]))
        .unwrap();
        assert_eq!(config.admin_email.as_deref(), Some("admin@tools.test"));

        let store = connect_store(&config).await.unwrap();
        assert!(store.is_admin("admin@tools.test").await.unwrap());

        assert!(AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("STORE_BACKEND", "memory"),
            ("ADMIN_EMAIL", "not-an-email"),
        ]))
        .is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_SECRET", "s"),
            ("STORE_BACKEND", "memory"),
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
        ]))
        .unwrap();

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }
}
