//! Identity verification seam used by the access guard.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use invenfinder_core::config::SsoProviderConfig;

/// Claims returned by a provider's userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable subject identifier.
    pub sub: String,
    /// Login name, when the provider sends one under this key.
    #[serde(default)]
    pub username: Option<String>,
    /// Standard OIDC login name claim.
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserInfo {
    /// The name local accounts are matched against.
    pub fn login_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.preferred_username.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Exchanges bearer tokens for identity claims.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Configuration of a registered provider.
    fn provider(&self, name: &str) -> Option<SsoProviderConfig>;

    /// Claims for `token` at provider `name`. Every failure, including
    /// timeouts and unknown providers, yields `None`.
    async fn get_user_info(&self, name: &str, token: &str) -> Option<UserInfo>;
}
