//! Identity-provider collaborator.
//!
//! The provider is an opaque external service with two contracts the portal
//! relies on: verifying the short-lived bearer tokens it issues, and
//! answering "which sign-in methods does this email already have" for the
//! pre-signup check.

pub mod token;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IdentityConfig;

/// The authenticated caller, as attested by a verified token.
#[derive(Debug, Clone)]
pub struct IdentityClaims {
    pub uid: String,
    pub email: String,
}

/// Directory answer for one email address.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    /// Provider ids in the order the directory reports them,
    /// e.g. "password", "google.com".
    pub providers: Vec<String>,
}

impl DirectoryEntry {
    pub fn has_password(&self) -> bool {
        self.providers.iter().any(|p| p == "password")
    }

    pub fn has_google(&self) -> bool {
        self.providers.iter().any(|p| p == "google.com")
    }

    pub fn primary_provider(&self) -> Option<&str> {
        self.providers.first().map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity provider rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("identity provider misconfigured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer token; returns who the caller is.
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims, IdentityError>;

    /// Look an email up in the provider's user directory. `None` means the
    /// address has no account yet.
    async fn lookup_email(&self, email: &str) -> Result<Option<DirectoryEntry>, IdentityError>;
}

/// Production implementation: local token verification plus the provider's
/// accounts-lookup endpoint.
pub struct HttpIdentityProvider {
    config: IdentityConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    provider_user_info: Vec<ProviderInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInfo {
    provider_id: String,
}

impl HttpIdentityProvider {
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims, IdentityError> {
        token::verify(token, &self.config)
    }

    async fn lookup_email(&self, email: &str) -> Result<Option<DirectoryEntry>, IdentityError> {
        let mut url = url::Url::parse(&self.config.directory_url)
            .map_err(|e| IdentityError::Misconfigured(format!("bad directory url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| IdentityError::Misconfigured("directory url cannot be a base".into()))?
            .push("accounts:lookup");
        url.query_pairs_mut().append_pair("key", &self.config.api_key);

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "email": [email] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api { status: status.as_u16(), message });
        }

        let body: LookupResponse = response.json().await?;
        let Some(user) = body.users.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(DirectoryEntry {
            providers: user
                .provider_user_info
                .into_iter()
                .map(|p| p.provider_id)
                .collect(),
        }))
    }
}
