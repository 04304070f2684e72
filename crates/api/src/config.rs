//! Process configuration, resolved once at startup.

use anyhow::Context;

/// Settings the server runs with. Read from the environment in `main`,
/// then passed down explicitly; nothing consults env vars after startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    /// Allowed CORS origins; a single `*` entry allows any origin.
    pub cors_origins: Vec<String>,
    pub store: StoreConfig,
}

/// Which storage backend to run against.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    InMemory,
    Postgres { database_url: String },
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// `JWT_SECRET` has no default and missing it is a startup error.
    /// `DATABASE_URL` is required only when `USE_PERSISTENT_STORE=true`.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let use_persistent = std::env::var("USE_PERSISTENT_STORE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let store = if use_persistent {
            let database_url = std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set when USE_PERSISTENT_STORE=true")?;
            StoreConfig::Postgres { database_url }
        } else {
            StoreConfig::InMemory
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            cors_origins,
            store,
        })
    }
}
