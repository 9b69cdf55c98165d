//! HTTP client for configured OpenID Connect providers.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use invenfinder_core::config::{SsoConfig, SsoProviderConfig};
use invenfinder_core::error::{AppError, ErrorKind};
use invenfinder_core::result::AppResult;

use super::discovery::{ProviderMetadata, ProviderSummary, discovery_url};
use super::verifier::{IdentityVerifier, UserInfo};

/// Provider registry plus a process-lifetime cache of discovery documents.
pub struct SsoDelegate {
    client: reqwest::Client,
    providers: Vec<SsoProviderConfig>,
    discovered: RwLock<HashMap<String, ProviderMetadata>>,
}

impl std::fmt::Debug for SsoDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoDelegate")
            .field("providers", &self.providers)
            .finish()
    }
}

impl SsoDelegate {
    /// Builds the delegate and its HTTP client. No network calls are made.
    pub fn new(config: &SsoConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build identity provider HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            providers: config.providers.clone(),
            discovered: RwLock::new(HashMap::new()),
        })
    }

    /// Fetches and caches the discovery document of provider `name`.
    pub async fn discover(&self, name: &str) -> AppResult<ProviderMetadata> {
        let provider = self
            .find(name)
            .ok_or_else(|| AppError::not_found(format!("Unknown SSO provider '{name}'")))?;

        let metadata = self
            .client
            .get(discovery_url(&provider.issuer))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Discovery request for '{name}' failed"),
                    e,
                )
            })?
            .json::<ProviderMetadata>()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Discovery document for '{name}' is invalid"),
                    e,
                )
            })?;

        self.discovered
            .write()
            .await
            .insert(name.to_string(), metadata.clone());

        info!(
            provider = %name,
            issuer = %metadata.issuer,
            "SSO provider discovered"
        );
        Ok(metadata)
    }

    /// Discovers every configured provider. A failing provider is logged and
    /// skipped. Returns the number discovered.
    pub async fn discover_all(&self) -> usize {
        let mut discovered = 0;
        for provider in &self.providers {
            match self.discover(&provider.name).await {
                Ok(_) => discovered += 1,
                Err(e) => warn!(
                    provider = %provider.name,
                    error = %e,
                    "SSO provider discovery failed"
                ),
            }
        }
        discovered
    }

    /// Providers whose discovery succeeded, in configuration order.
    pub async fn discovered_providers(&self) -> Vec<ProviderSummary> {
        let discovered = self.discovered.read().await;
        self.providers
            .iter()
            .filter_map(|provider| {
                discovered.get(&provider.name).map(|metadata| ProviderSummary {
                    name: provider.name.clone(),
                    issuer: provider.issuer.clone(),
                    client_id: provider.client_id.clone(),
                    authorization_endpoint: metadata.authorization_endpoint.clone(),
                    token_endpoint: metadata.token_endpoint.clone(),
                })
            })
            .collect()
    }

    fn find(&self, name: &str) -> Option<&SsoProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Cached metadata, discovering on first use if startup discovery
    /// failed.
    async fn metadata(&self, name: &str) -> Option<ProviderMetadata> {
        if let Some(metadata) = self.discovered.read().await.get(name) {
            return Some(metadata.clone());
        }
        match self.discover(name).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!(provider = %name, error = %e, "SSO provider unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityVerifier for SsoDelegate {
    fn provider(&self, name: &str) -> Option<SsoProviderConfig> {
        self.find(name).cloned()
    }

    async fn get_user_info(&self, name: &str, token: &str) -> Option<UserInfo> {
        self.find(name)?;
        let endpoint = self.metadata(name).await?.userinfo_endpoint?;

        let response = match self.client.get(&endpoint).bearer_auth(token).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = %name, error = %e, "Userinfo request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(
                provider = %name,
                status = response.status().as_u16(),
                "Userinfo request rejected"
            );
            return None;
        }

        match response.json::<UserInfo>().await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(provider = %name, error = %e, "Userinfo response is invalid");
                None
            }
        }
    }
}
