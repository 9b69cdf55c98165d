//! OpenID provider metadata.

use serde::{Deserialize, Serialize};

/// The subset of the discovery document the server uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer identifier.
    pub issuer: String,
    /// Browser authorization endpoint.
    #[serde(default)]
    pub authorization_endpoint: Option<String>,
    /// Code exchange endpoint.
    #[serde(default)]
    pub token_endpoint: Option<String>,
    /// Claims endpoint queried with the bearer token.
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
}

/// Public description of a discovered provider, safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    /// Registry name.
    pub name: String,
    /// Issuer URL.
    pub issuer: String,
    /// OAuth client id for the browser flow.
    pub client_id: String,
    /// Browser authorization endpoint.
    pub authorization_endpoint: Option<String>,
    /// Code exchange endpoint.
    pub token_endpoint: Option<String>,
}

/// Discovery document location for an issuer.
pub fn discovery_url(issuer: &str) -> String {
    format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    )
}
