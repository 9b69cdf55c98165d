//! OpenID Connect provider registry configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How upstream identity claims may bind to local accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsoProvisioning {
    /// Claims never bind to a local account.
    Disabled,
    /// Bind to an existing user with the claimed username; never create.
    #[default]
    ExistingOnly,
    /// Bind to an existing user or create one.
    Auto,
}

impl fmt::Display for SsoProvisioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::ExistingOnly => write!(f, "existing_only"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// A single configured identity provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct SsoProviderConfig {
    /// Registry key, sent by clients in the `SSO-Name` header.
    pub name: String,
    /// Issuer URL; discovery appends `/.well-known/openid-configuration`.
    pub issuer: String,
    /// OAuth client id, handed to the browser for the PKCE flow.
    pub client_id: String,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,
    /// Account binding policy.
    #[serde(default)]
    pub provisioning: SsoProvisioning,
    /// When non-empty, only these usernames may bind.
    #[serde(default)]
    pub allowed_usernames: Vec<String>,
}

impl fmt::Debug for SsoProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoProviderConfig")
            .field("name", &self.name)
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("provisioning", &self.provisioning)
            .field("allowed_usernames", &self.allowed_usernames)
            .finish()
    }
}

/// Identity provider registry and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoConfig {
    /// Timeout for discovery and userinfo calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Configured providers.
    #[serde(default)]
    pub providers: Vec<SsoProviderConfig>,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            http_timeout_seconds: default_http_timeout(),
            providers: Vec::new(),
        }
    }
}

fn default_http_timeout() -> u64 {
    5
}
