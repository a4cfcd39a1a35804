#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use brightstart_api::config::{
    AppConfig, Environment, IdentityConfig, ServerConfig, SessionConfig, StoreBackend, StoreConfig,
};
use brightstart_api::identity::{token, DirectoryEntry, IdentityClaims, IdentityError, IdentityProvider};
use brightstart_api::server;
use brightstart_api::state::AppState;
use brightstart_api::store::MemoryStore;
use brightstart_api::types::Role;

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        server: ServerConfig { port: 0, cors_origins: vec![] },
        identity: IdentityConfig {
            token_secret: "integration-test-secret".into(),
            issuer: "https://identity.test".into(),
            audience: "portal-test".into(),
            directory_url: "https://identity.test/v1".into(),
            api_key: "test-key".into(),
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            base_url: "https://store.test/v0".into(),
            api_key: "test-key".into(),
            base_id: "appTEST".into(),
            users_table: "Users".into(),
            issues_table: "Issues".into(),
            changelog_table: "ChangeLog".into(),
            request_timeout_secs: 5,
        },
        session: SessionConfig {
            timeout_secs: 300,
            profile_poll_secs: 8,
            issue_poll_secs: 5,
            activity_throttle_secs: 30,
        },
    }
}

/// Identity provider double: verifies the same tokens `token::mint` issues
/// and answers directory lookups from a fixed map.
pub struct TestIdentity {
    config: IdentityConfig,
    directory: HashMap<String, Vec<String>>,
}

#[async_trait::async_trait]
impl IdentityProvider for TestIdentity {
    async fn verify_token(&self, raw: &str) -> Result<IdentityClaims, IdentityError> {
        token::verify(raw, &self.config)
    }

    async fn lookup_email(&self, email: &str) -> Result<Option<DirectoryEntry>, IdentityError> {
        Ok(self
            .directory
            .get(email)
            .map(|providers| DirectoryEntry { providers: providers.clone() }))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_directory(HashMap::new())
    }

    pub fn with_directory(directory: HashMap<String, Vec<String>>) -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(TestIdentity { config: config.identity.clone(), directory });
        let state = AppState::assemble(identity, store.clone(), &config);
        let router = server::app(state);
        Self { router, store, config }
    }

    pub fn token_for(&self, uid: &str, email: &str) -> String {
        let claims = token::Claims::new(uid.into(), email.into(), &self.config.identity, 3600);
        token::mint(&claims, &self.config.identity).expect("mint test token")
    }

    pub fn seed_user(&self, uid: &str, email: &str, name: &str, role: Role) -> String {
        self.store.seed(
            "Users",
            fields(json!({
                "uid": uid,
                "email": email,
                "displayName": name,
                "phone": "",
                "role": role.as_str(),
            })),
        )
    }

    pub fn seed_issue(&self, title: &str, description: &str, resolved: bool) -> String {
        self.store.seed(
            "Issues",
            fields(json!({
                "issue": title,
                "description": description,
                "resolved": resolved,
            })),
        )
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request("GET", path, token, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        self.request("POST", path, token, body).await
    }

    pub async fn put(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        self.request("PUT", path, token, body).await
    }
}

pub fn fields(value: Value) -> Map<String, Value> {
    value.as_object().expect("object literal").clone()
}
