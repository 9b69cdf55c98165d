//! Session lifecycle manager.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use invenfinder_core::result::AppResult;
use invenfinder_database::SessionRepository;
use invenfinder_entity::session::Session;
use invenfinder_entity::user::User;

use super::token::generate_token;

/// Creates, looks up and ends sessions.
///
/// Local sessions are deleted when they end. SSO sessions are only marked
/// revoked unless deletion is forced, so the upstream token they carry can
/// never authenticate again.
#[derive(Clone)]
pub struct SessionManager {
    /// Session persistence.
    sessions: Arc<dyn SessionRepository>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// Creates and persists a session for `user`.
    ///
    /// A token is minted when none is supplied; SSO flows pass the upstream
    /// access token together with the provider name.
    pub async fn create(
        &self,
        user: &User,
        ip: &str,
        user_agent: &str,
        token: Option<String>,
        sso_provider: Option<&str>,
    ) -> AppResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            token: token.unwrap_or_else(generate_token),
            user_id: user.id,
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            created_at: now,
            sso_provider: sso_provider.map(str::to_string),
            // SSO sessions are created right after a successful userinfo call
            last_verified: sso_provider.map(|_| now),
            revoked: false,
        };

        self.sessions.save(&session).await?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            sso_provider = session.sso_provider.as_deref().unwrap_or("-"),
            "Session created"
        );

        Ok(session)
    }

    /// Finds a session by bearer token. Revoked sessions are returned too.
    pub async fn get_by_token(&self, token: &str) -> AppResult<Option<Session>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.sessions.find_by_token(token).await
    }

    /// Finds a session by id.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        self.sessions.find_by_id(id).await
    }

    /// Lists every session of `user`, newest first.
    pub async fn get_user_sessions(&self, user: &User) -> AppResult<Vec<Session>> {
        self.sessions.find_by_user(user.id).await
    }

    /// Ends a session. SSO sessions are revoked unless `force` is set;
    /// local sessions are always deleted.
    pub async fn delete(&self, session: &Session, force: bool) -> AppResult<()> {
        if session.is_sso() && !force {
            self.revoke(session).await?;
            return Ok(());
        }

        self.sessions.delete(session.id).await?;
        info!(
            user_id = %session.user_id,
            session_id = %session.id,
            "Session deleted"
        );
        Ok(())
    }

    /// Ends every session of `user`.
    pub async fn delete_all_for_user(&self, user: &User) -> AppResult<()> {
        let revoked = self.sessions.revoke_sso_by_user(user.id).await?;
        let deleted = self.sessions.delete_local_by_user(user.id).await?;
        info!(
            user_id = %user.id,
            revoked,
            deleted,
            "All user sessions ended"
        );
        Ok(())
    }

    /// Ends every session of `user` except `keep`.
    pub async fn delete_others(&self, user: &User, keep: &Session) -> AppResult<()> {
        for session in self.get_user_sessions(user).await? {
            if session.id != keep.id && !session.revoked {
                self.delete(&session, false).await?;
            }
        }
        Ok(())
    }

    /// Marks a session revoked. A session that no longer exists stays gone.
    pub async fn revoke(&self, session: &Session) -> AppResult<()> {
        if self.sessions.revoke(session.id).await? {
            info!(
                user_id = %session.user_id,
                session_id = %session.id,
                "Session revoked"
            );
        }
        Ok(())
    }

    /// Persists a successful identity-provider confirmation.
    ///
    /// Returns `None` if the session was ended while the provider was being
    /// asked.
    pub async fn mark_verified(
        &self,
        session: &Session,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        self.sessions.mark_verified(session.id, at).await
    }
}
