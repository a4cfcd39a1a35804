use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Identity-provider collaborator settings. Tokens are verified with the
/// shared secret; the directory endpoint answers email lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub token_secret: String,
    pub issuer: String,
    pub audience: String,
    pub directory_url: String,
    pub api_key: String,
}

/// Which record-store backend to run against. `Memory` keeps everything in
/// process and is the development default so the server starts without
/// provider credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Http,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub base_url: String,
    pub api_key: String,
    pub base_id: String,
    pub users_table: String,
    pub issues_table: String,
    pub changelog_table: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Validity window for keeping a profile across a transient signed-out event
    pub timeout_secs: u64,
    /// Background profile refresh interval
    pub profile_poll_secs: u64,
    /// Background issue-list refresh interval
    pub issue_poll_secs: u64,
    /// Minimum gap between persisted activity-timestamp writes
    pub activity_throttle_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORTAL_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("PORTAL_CORS_ORIGINS") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_TOKEN_SECRET") {
            self.identity.token_secret = v;
        }
        if let Ok(v) = env::var("IDENTITY_ISSUER") {
            self.identity.issuer = v;
        }
        if let Ok(v) = env::var("IDENTITY_AUDIENCE") {
            self.identity.audience = v;
        }
        if let Ok(v) = env::var("IDENTITY_DIRECTORY_URL") {
            self.identity.directory_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_API_KEY") {
            self.identity.api_key = v;
        }

        // Record store overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store.backend = match v.as_str() {
                "memory" => StoreBackend::Memory,
                _ => StoreBackend::Http,
            };
        }
        if let Ok(v) = env::var("STORE_BASE_URL") {
            self.store.base_url = v;
        }
        if let Ok(v) = env::var("STORE_API_KEY") {
            self.store.api_key = v;
        }
        if let Ok(v) = env::var("STORE_BASE_ID") {
            self.store.base_id = v;
        }
        if let Ok(v) = env::var("STORE_USERS_TABLE") {
            self.store.users_table = v;
        }
        if let Ok(v) = env::var("STORE_ISSUES_TABLE") {
            self.store.issues_table = v;
        }
        if let Ok(v) = env::var("STORE_CHANGELOG_TABLE") {
            self.store.changelog_table = v;
        }
        if let Ok(v) = env::var("STORE_REQUEST_TIMEOUT_SECS") {
            self.store.request_timeout_secs = v.parse().unwrap_or(self.store.request_timeout_secs);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_TIMEOUT_SECS") {
            self.session.timeout_secs = v.parse().unwrap_or(self.session.timeout_secs);
        }
        if let Ok(v) = env::var("SESSION_PROFILE_POLL_SECS") {
            self.session.profile_poll_secs = v.parse().unwrap_or(self.session.profile_poll_secs);
        }
        if let Ok(v) = env::var("SESSION_ISSUE_POLL_SECS") {
            self.session.issue_poll_secs = v.parse().unwrap_or(self.session.issue_poll_secs);
        }
        if let Ok(v) = env::var("SESSION_ACTIVITY_THROTTLE_SECS") {
            self.session.activity_throttle_secs =
                v.parse().unwrap_or(self.session.activity_throttle_secs);
        }

        self
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig {
                port: 5000,
                cors_origins: vec![],
            },
            identity: IdentityConfig {
                token_secret: String::new(),
                issuer: "https://identity.brightstart.example".to_string(),
                audience: "brightstart-portal".to_string(),
                directory_url: "https://identity.brightstart.example/v1".to_string(),
                api_key: String::new(),
            },
            store: StoreConfig {
                backend: StoreBackend::Http,
                base_url: "https://api.recordstore.example/v0".to_string(),
                api_key: String::new(),
                base_id: String::new(),
                users_table: "Users".to_string(),
                issues_table: "Issues".to_string(),
                changelog_table: "ChangeLog".to_string(),
                request_timeout_secs: 10,
            },
            session: SessionConfig {
                timeout_secs: 300,
                profile_poll_secs: 8,
                issue_poll_secs: 5,
                activity_throttle_secs: 30,
            },
        }
    }

    fn development() -> Self {
        let mut config = Self::base(Environment::Development);
        config.store.backend = StoreBackend::Memory;
        config.server.cors_origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
        ];
        config
    }

    fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.server.cors_origins = vec!["https://staging.brightstart.example".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.server.cors_origins = vec!["https://portal.brightstart.example".to_string()];
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.session.timeout_secs, 300);
        assert!(!config.server.cors_origins.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.store.backend, StoreBackend::Http);
        assert_eq!(config.store.users_table, "Users");
        assert_eq!(config.session.activity_throttle_secs, 30);
    }
}
