//! Session and user resolution for a request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use invenfinder_core::config::{SessionConfig, SsoProviderConfig, SsoProvisioning};
use invenfinder_core::error::{AppError, ErrorKind};
use invenfinder_core::result::AppResult;
use invenfinder_database::UserRepository;
use invenfinder_entity::session::Session;
use invenfinder_entity::user::{User, permission};

use crate::password::PasswordHasher;
use crate::session::SessionManager;
use crate::sso::{IdentityVerifier, UserInfo};

use super::context::RequestContext;

/// Resolves "who is calling" for a [`RequestContext`].
///
/// Resolution order:
///
/// 1. Cached result for this request
/// 2. Bearer token from the context; none means unauthenticated
/// 3. Session lookup by token; revoked sessions never authenticate
/// 4. Stale SSO sessions are re-checked with their provider, and revoked
///    for good if the provider no longer accepts the token
/// 5. An unknown token with an `SSO-Name` hint is exchanged for claims and
///    bound to a local user under the provider's provisioning policy
#[derive(Clone)]
pub struct AccessGuard {
    sessions: Arc<SessionManager>,
    users: Arc<dyn UserRepository>,
    verifier: Arc<dyn IdentityVerifier>,
    hasher: Arc<PasswordHasher>,
    revalidation_interval: Duration,
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("revalidation_interval", &self.revalidation_interval)
            .finish()
    }
}

impl AccessGuard {
    /// Creates a new access guard.
    pub fn new(
        sessions: Arc<SessionManager>,
        users: Arc<dyn UserRepository>,
        verifier: Arc<dyn IdentityVerifier>,
        hasher: Arc<PasswordHasher>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            users,
            verifier,
            hasher,
            revalidation_interval: config.revalidation_interval(),
        }
    }

    /// The caller's valid session, if any.
    pub async fn session(&self, ctx: &RequestContext) -> AppResult<Option<Session>> {
        ctx.session
            .get_or_try_init(|| self.load_session(ctx))
            .await
            .cloned()
    }

    /// The caller's user, if a session resolves and its user exists.
    pub async fn user(&self, ctx: &RequestContext) -> AppResult<Option<User>> {
        ctx.user
            .get_or_try_init(|| self.load_user(ctx))
            .await
            .cloned()
    }

    /// Whether the caller is authenticated. With an SSO hint the bound user
    /// must resolve as well.
    pub async fn authenticated(&self, ctx: &RequestContext) -> AppResult<bool> {
        if ctx.credentials().sso_provider.is_some() {
            return Ok(self.user(ctx).await?.is_some());
        }
        Ok(self.session(ctx).await?.is_some())
    }

    /// Whether the caller's user holds all (or, with `match_any`, any) of
    /// the `required` permission bits.
    pub async fn has_permissions(
        &self,
        ctx: &RequestContext,
        required: u64,
        match_any: bool,
    ) -> AppResult<bool> {
        let Some(user) = self.user(ctx).await? else {
            return Ok(false);
        };
        Ok(if match_any {
            permission::has_any(required, user.permissions)
        } else {
            permission::has_all(required, user.permissions)
        })
    }

    async fn load_session(&self, ctx: &RequestContext) -> AppResult<Option<Session>> {
        let Some(token) = ctx.credentials().token.as_deref() else {
            return Ok(None);
        };

        if let Some(session) = self.sessions.get_by_token(token).await? {
            if session.revoked {
                debug!(session_id = %session.id, "Revoked session presented");
                return Ok(None);
            }
            if session.needs_revalidation(self.revalidation_interval, Utc::now()) {
                return self.revalidate(session).await;
            }
            return Ok(Some(session));
        }

        match ctx.credentials().sso_provider.as_deref() {
            Some(provider) => self.exchange(ctx, provider, token).await,
            None => Ok(None),
        }
    }

    async fn load_user(&self, ctx: &RequestContext) -> AppResult<Option<User>> {
        let Some(session) = self.session(ctx).await? else {
            return Ok(None);
        };

        let user = self.users.find_by_id(session.user_id).await?;
        if user.is_none() {
            error!(
                session_id = %session.id,
                user_id = %session.user_id,
                "Session references a missing user"
            );
        }
        Ok(user)
    }

    /// Asks the provider whether a stale SSO session's token is still good.
    ///
    /// Runs on its own task so the outcome is persisted even if the request
    /// is dropped mid-flight.
    async fn revalidate(&self, session: Session) -> AppResult<Option<Session>> {
        let sessions = self.sessions.clone();
        let verifier = self.verifier.clone();

        let task = tokio::spawn(async move {
            let provider = session.sso_provider.clone().unwrap_or_default();
            match verifier.get_user_info(&provider, &session.token).await {
                Some(_) => {
                    let verified = sessions.mark_verified(&session, Utc::now()).await?;
                    match &verified {
                        Some(_) => info!(
                            session_id = %session.id,
                            provider = %provider,
                            "SSO session revalidated"
                        ),
                        None => debug!(
                            session_id = %session.id,
                            provider = %provider,
                            "SSO session ended during revalidation"
                        ),
                    }
                    Ok::<_, AppError>(verified)
                }
                None => {
                    sessions.revoke(&session).await?;
                    warn!(
                        session_id = %session.id,
                        provider = %provider,
                        "SSO session revoked after failed revalidation"
                    );
                    Ok::<_, AppError>(None)
                }
            }
        });

        task.await.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Session revalidation task failed", e)
        })?
    }

    /// Binds an unknown upstream token to a local user and session.
    async fn exchange(
        &self,
        ctx: &RequestContext,
        provider: &str,
        token: &str,
    ) -> AppResult<Option<Session>> {
        let Some(config) = self.verifier.provider(provider) else {
            debug!(provider = %provider, "SSO hint names an unknown provider");
            return Ok(None);
        };
        if config.provisioning == SsoProvisioning::Disabled {
            return Ok(None);
        }

        let Some(info) = self.verifier.get_user_info(provider, token).await else {
            return Ok(None);
        };
        let Some(user) = self.provision(&config, &info).await? else {
            return Ok(None);
        };

        let created = self
            .sessions
            .create(
                &user,
                ctx.ip_or_unknown(),
                ctx.user_agent(),
                Some(token.to_string()),
                Some(provider),
            )
            .await;

        match created {
            Ok(session) => Ok(Some(session)),
            // a concurrent request bound the same token first
            Err(e) if e.kind == ErrorKind::Conflict => Ok(self
                .sessions
                .get_by_token(token)
                .await?
                .filter(|session| !session.revoked)),
            Err(e) => Err(e),
        }
    }

    /// Applies the provider's provisioning policy to upstream claims.
    async fn provision(
        &self,
        config: &SsoProviderConfig,
        info: &UserInfo,
    ) -> AppResult<Option<User>> {
        let Some(username) = info.login_name() else {
            warn!(provider = %config.name, sub = %info.sub, "SSO claims carry no username");
            return Ok(None);
        };

        if !config.allowed_usernames.is_empty()
            && !config.allowed_usernames.iter().any(|allowed| allowed == username)
        {
            warn!(
                provider = %config.name,
                username = %username,
                "SSO username is not on the provider allow list"
            );
            return Ok(None);
        }

        let existing = self.users.find_by_username(username).await?;
        match config.provisioning {
            SsoProvisioning::Disabled => Ok(None),
            SsoProvisioning::ExistingOnly => {
                if existing.is_none() {
                    info!(
                        provider = %config.name,
                        username = %username,
                        "SSO login for unknown user refused"
                    );
                }
                Ok(existing)
            }
            SsoProvisioning::Auto => {
                if existing.is_some() {
                    return Ok(existing);
                }

                let credentials = self.hasher.unusable()?;
                let user = User::new(username, credentials.salt, credentials.hash, 0);
                match self.users.save(&user).await {
                    Ok(()) => {
                        info!(
                            provider = %config.name,
                            user_id = %user.id,
                            username = %username,
                            "User provisioned from SSO claims"
                        );
                        Ok(Some(user))
                    }
                    Err(e) if e.kind == ErrorKind::Conflict => {
                        self.users.find_by_username(username).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}
