//! Typed client for the portal API.
//!
//! The front-end embeds this alongside the session module. Every call
//! attaches a fresh bearer token from the `TokenSource` seam (the identity
//! SDK's job), and the server's `{error, message}` envelope is folded into
//! `ClientError` so callers see one error shape regardless of transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::session::{IssuesApi, SessionApi};
use crate::types::{Issue, ProfileUpdate, Role, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with its error envelope.
    #[error("{message}")]
    Api {
        status: u16,
        category: String,
        message: String,
    },
    /// Request made but no usable response.
    #[error("no response from server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no authentication token available")]
    NoToken,
    #[error("invalid portal base url: {0}")]
    BadBaseUrl(String),
}

/// Supplies the current short-lived bearer token and revokes the session on
/// logout. Backed by the identity provider's SDK in a real front-end.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn current_token(&self) -> Option<String>;

    /// Revoke the provider session. Default: nothing to revoke.
    async fn revoke(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Token holder for tests, CLI use, and headless embedding.
#[derive(Default)]
pub struct StaticTokenSource {
    token: Mutex<Option<String>>,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.lock().unwrap() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.lock().unwrap() = None;
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn current_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    async fn revoke(&self) -> Result<(), ClientError> {
        self.clear();
        Ok(())
    }
}

pub struct PortalClient {
    http: reqwest::Client,
    base_url: url::Url,
    tokens: Arc<dyn TokenSource>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    users: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct IssueEnvelope {
    issue: Issue,
}

#[derive(Debug, Deserialize)]
struct IssuesEnvelope {
    issues: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// Answer to the pre-signup email check.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCheck {
    pub exists: bool,
    pub auth_provider: Option<String>,
    pub has_password: bool,
    pub has_google: bool,
}

/// Admin-path update; the only client call that can carry a role.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl PortalClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> Result<Self, ClientError> {
        let base_url =
            url::Url::parse(base_url).map_err(|e| ClientError::BadBaseUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, base_url, tokens })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::BadBaseUrl(e.to_string()))
    }

    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self
            .tokens
            .current_token()
            .await
            .ok_or(ClientError::NoToken)?;
        Ok(self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(token))
    }

    async fn expect<T: serde::de::DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let envelope = response
            .json::<ErrorEnvelope>()
            .await
            .unwrap_or_else(|_| ErrorEnvelope {
                error: status.to_string(),
                message: "An error occurred".to_string(),
            });
        Err(ClientError::Api {
            status: status.as_u16(),
            category: envelope.error,
            message: envelope.message,
        })
    }

    pub async fn bootstrap(&self) -> Result<UserProfile, ClientError> {
        let request = self.authed(Method::POST, "api/bootstrap").await?;
        Ok(Self::expect::<UserEnvelope>(request).await?.user)
    }

    pub async fn get_profile(&self) -> Result<UserProfile, ClientError> {
        let request = self.authed(Method::GET, "api/profile").await?;
        Ok(Self::expect::<UserEnvelope>(request).await?.user)
    }

    pub async fn put_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ClientError> {
        let request = self.authed(Method::PUT, "api/profile").await?.json(update);
        Ok(Self::expect::<UserEnvelope>(request).await?.user)
    }

    /// Public route; no token attached.
    pub async fn check_email(&self, email: &str) -> Result<EmailCheck, ClientError> {
        let mut url = self.endpoint("api/check-email")?;
        url.query_pairs_mut().append_pair("email", email);
        Self::expect(self.http.get(url)).await
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserProfile>, ClientError> {
        let mut url = self.endpoint("api/admin/users/search")?;
        url.query_pairs_mut().append_pair("q", query);
        let token = self
            .tokens
            .current_token()
            .await
            .ok_or(ClientError::NoToken)?;
        let request = self.http.get(url).bearer_auth(token);
        Ok(Self::expect::<UsersEnvelope>(request).await?.users)
    }

    pub async fn update_user_as_admin(
        &self,
        uid: &str,
        update: &AdminUserUpdate,
    ) -> Result<UserProfile, ClientError> {
        let body = json!({
            "displayName": update.display_name,
            "phone": update.phone,
            "role": update.role,
        });
        let request = self
            .authed(Method::PUT, &format!("api/admin/users/{}", uid))
            .await?
            .json(&body);
        Ok(Self::expect::<UserEnvelope>(request).await?.user)
    }

    pub async fn submit_issue(
        &self,
        issue: &str,
        description: &str,
    ) -> Result<Issue, ClientError> {
        let request = self
            .authed(Method::POST, "api/issues")
            .await?
            .json(&json!({ "issue": issue, "description": description }));
        Ok(Self::expect::<IssueEnvelope>(request).await?.issue)
    }

    pub async fn get_issues(&self, include_resolved: bool) -> Result<Vec<Issue>, ClientError> {
        let mut url = self.endpoint("api/issues")?;
        url.query_pairs_mut()
            .append_pair("includeResolved", if include_resolved { "true" } else { "false" });
        let token = self
            .tokens
            .current_token()
            .await
            .ok_or(ClientError::NoToken)?;
        let request = self.http.get(url).bearer_auth(token);
        Ok(Self::expect::<IssuesEnvelope>(request).await?.issues)
    }

    pub async fn put_issue_resolved(&self, id: &str) -> Result<Issue, ClientError> {
        let request = self
            .authed(Method::PUT, &format!("api/issues/{}/resolve", id))
            .await?;
        Ok(Self::expect::<IssueEnvelope>(request).await?.issue)
    }
}

#[async_trait]
impl SessionApi for PortalClient {
    async fn bootstrap(&self) -> Result<UserProfile, ClientError> {
        PortalClient::bootstrap(self).await
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ClientError> {
        self.get_profile().await
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, ClientError> {
        self.put_profile(&update).await
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        self.tokens.revoke().await
    }
}

#[async_trait]
impl IssuesApi for PortalClient {
    async fn list_issues(&self, include_resolved: bool) -> Result<Vec<Issue>, ClientError> {
        self.get_issues(include_resolved).await
    }

    async fn resolve_issue(&self, id: &str) -> Result<Issue, ClientError> {
        self.put_issue_resolved(id).await
    }
}
