//! In-memory session repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;
use invenfinder_entity::session::Session;

use crate::repositories::SessionRepository;

/// Sessions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn save(&self, session: &Session) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;

        let taken = sessions
            .values()
            .any(|existing| existing.token == session.token && existing.id != session.id);
        if taken {
            return Err(AppError::conflict("Session token is already bound"));
        }

        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(&id).filter(|s| !s.revoked).map(|session| {
            session.last_verified = Some(at);
            session.clone()
        }))
    }

    async fn revoke(&self, id: Uuid) -> AppResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(session) => {
                session.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().find(|s| s.token == token).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }

    async fn revoke_sso_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for session in sessions
            .values_mut()
            .filter(|s| s.user_id == user_id && s.is_sso() && !s.revoked)
        {
            session.revoked = true;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_local_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id || s.is_sso());
        Ok((before - sessions.len()) as u64)
    }
}
