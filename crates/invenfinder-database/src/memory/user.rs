//! In-memory user repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;
use invenfinder_entity::user::User;

use crate::repositories::UserRepository;

/// Users keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn save(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;

        // Uniqueness is checked under the same write lock as the insert
        let taken = users
            .values()
            .any(|existing| existing.username == user.username && existing.id != user.id);
        if taken {
            return Err(
                AppError::conflict(format!("Username '{}' is already taken", user.username))
                    .with_code("USERNAME_TAKEN"),
            );
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
